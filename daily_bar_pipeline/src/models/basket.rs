//! The fixed set of symbols fetched in one run.
//!
//! A basket comes from one of three places, in order of preference: an
//! explicit list in the configuration, the vendor's index-constituent
//! endpoint, or a static fallback CSV with `con_code` and (optionally)
//! `stock_name` columns, the layout of Tushare's `index_weight` export.

use std::{collections::HashMap, io::Read, path::Path};

use indexmap::IndexMap;
use serde::Deserialize;

use crate::errors::Error;

/// One constituent, with its display name when known.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BasketMember {
    pub symbol: String,
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Basket {
    members: Vec<BasketMember>,
}

#[derive(Deserialize)]
struct ConstituentRow {
    con_code: String,
    #[serde(default)]
    stock_name: Option<String>,
}

impl Basket {
    /// Builds a basket from raw symbols. Whitespace is trimmed, blanks are
    /// dropped and repeats collapse onto their first occurrence.
    pub fn from_symbols<I, S>(symbols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::from_members(symbols.into_iter().map(|s| BasketMember {
            symbol: s.as_ref().to_string(),
            name: None,
        }))
    }

    fn from_members(members: impl IntoIterator<Item = BasketMember>) -> Self {
        let mut unique: IndexMap<String, Option<String>> = IndexMap::new();
        for member in members {
            let symbol = member.symbol.trim().to_string();
            if symbol.is_empty() {
                continue;
            }
            let name = member
                .name
                .map(|n| n.trim().to_string())
                .filter(|n| !n.is_empty());
            let slot = unique.entry(symbol).or_default();
            if slot.is_none() {
                *slot = name;
            }
        }
        Self {
            members: unique
                .into_iter()
                .map(|(symbol, name)| BasketMember { symbol, name })
                .collect(),
        }
    }

    /// Reads a constituent CSV (`con_code`, optional `stock_name`; other
    /// columns are ignored). Index-weight exports list a constituent once per
    /// rebalance date, so repeats are collapsed.
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self, Error> {
        let mut rdr = csv::Reader::from_reader(reader);
        let mut members = Vec::new();
        for row in rdr.deserialize::<ConstituentRow>() {
            let row = row?;
            members.push(BasketMember {
                symbol: row.con_code,
                name: row.stock_name,
            });
        }
        Ok(Self::from_members(members))
    }

    pub fn from_csv_path(path: impl AsRef<Path>) -> Result<Self, Error> {
        let file = std::fs::File::open(path.as_ref())?;
        Self::from_csv_reader(file)
    }

    pub fn symbols(&self) -> Vec<String> {
        self.members.iter().map(|m| m.symbol.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Symbol → display name, for members whose name is known.
    pub fn names(&self) -> HashMap<String, String> {
        self.members
            .iter()
            .filter_map(|m| m.name.clone().map(|n| (m.symbol.clone(), n)))
            .collect()
    }

    /// Fills missing names from another basket (typically the fallback CSV)
    /// without changing membership.
    pub fn with_names_from(mut self, other: &Basket) -> Self {
        let names = other.names();
        for member in &mut self.members {
            if member.name.is_none() {
                member.name = names.get(&member.symbol).cloned();
            }
        }
        self
    }
}

/// File-name label for an index code: the SSE 50 keeps its historical
/// `sse_50` label, everything else becomes the code with `.` replaced by `_`.
pub fn index_label(index_code: &str) -> String {
    if index_code == "000016.SH" {
        "sse_50".to_string()
    } else {
        index_code.replace('.', "_")
    }
}
