use std::{collections::BTreeMap, fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::utils::error::AppError;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Ballot {
    Yes,
    No,
}

impl Ballot {
    pub fn as_str(&self) -> &'static str {
        match self {
            Ballot::Yes => "yes",
            Ballot::No => "no",
        }
    }
}

impl fmt::Display for Ballot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Ballot {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "yes" => Ok(Ballot::Yes),
            "no" => Ok(Ballot::No),
            other => Err(AppError::ValidationError(format!(
                "Invalid ballot '{other}', expected 'yes' or 'no'"
            ))),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Comment {
    pub user: String,
    pub text: String,
}

/// A yes/no poll. `yes` and `no` always equal the number of voters holding
/// that ballot.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Poll {
    pub id: u64,
    pub question: String,
    #[serde(default)]
    pub yes: u64,
    #[serde(default)]
    pub no: u64,
    #[serde(default)]
    pub comments: Vec<Comment>,
    #[serde(default)]
    pub voters: BTreeMap<String, Ballot>,
}

impl Poll {
    pub fn new(id: u64, question: String) -> Self {
        Self {
            id,
            question,
            yes: 0,
            no: 0,
            comments: Vec::new(),
            voters: BTreeMap::new(),
        }
    }

    pub fn tally(&self, ballot: Ballot) -> u64 {
        self.voters.values().filter(|b| **b == ballot).count() as u64
    }

    /// Recomputes both counters from `voters`. Returns true when either
    /// counter had drifted.
    pub fn recount(&mut self) -> bool {
        let yes = self.tally(Ballot::Yes);
        let no = self.tally(Ballot::No);
        let drifted = yes != self.yes || no != self.no;
        self.yes = yes;
        self.no = no;
        drifted
    }
}
