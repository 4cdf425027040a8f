use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::Error;
use crate::types::price::Unit;

/// Per-lb base metals are quoted in plain dollars rather than per ounce.
const BASE_METALS: &[&str] = &["COPPER", "ALUMINUM", "ZINC", "NICKEL", "LEAD"];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Group {
    Gold,
    Silver,
    Crypto,
    Fx,
    Metals,
    Energy,
}

impl Group {
    pub const ALL: [Group; 6] = [
        Group::Gold,
        Group::Silver,
        Group::Crypto,
        Group::Fx,
        Group::Metals,
        Group::Energy,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Group::Gold => "gold",
            Group::Silver => "silver",
            Group::Crypto => "crypto",
            Group::Fx => "fx",
            Group::Metals => "metals",
            Group::Energy => "energy",
        }
    }

    /// Rotated groups pick one source per cycle; nested groups walk a list per sub-symbol.
    pub fn is_rotated(&self) -> bool {
        matches!(self, Group::Gold | Group::Silver | Group::Crypto | Group::Fx)
    }

    pub fn trades_on_weekends(&self) -> bool {
        !matches!(self, Group::Gold | Group::Silver)
    }

    pub fn unit_for(&self, symbol: &str) -> Unit {
        match self {
            Group::Gold | Group::Silver => Unit::Oz,
            Group::Crypto | Group::Energy => Unit::Usd,
            Group::Fx => Unit::Rate,
            Group::Metals if BASE_METALS.contains(&symbol) => Unit::Usd,
            Group::Metals => Unit::Oz,
        }
    }
}

impl fmt::Display for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Group {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Group::ALL
            .into_iter()
            .find(|g| g.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| Error::UnknownGroup(s.to_string()))
    }
}
