//! Fund → Inventory → Case tree.
//!
//! The whole tree is serialized as one JSON array of [`Fund`]s. Children are nested,
//! so removing a node from its parent's list removes every descendant with it.
//!
//! `New*` structs are creation payloads. `*Update` structs are partial patches where
//! `None` leaves a field untouched.

use serde::{Deserialize, Serialize};

use crate::app_response::AppResponse;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Fund {
    pub id: String,
    pub name: String,
    /// Registry number, e.g. `F.1`.
    pub number: String,
    pub description: String,
    pub start_year: String,
    pub end_year: String,
    #[serde(default)]
    pub inventories: Vec<Inventory>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Inventory {
    pub id: String,
    pub title: String,
    pub number: String,
    pub description: String,
    #[serde(default)]
    pub cases: Vec<Case>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Case {
    pub id: String,
    pub title: String,
    pub number: String,
    /// Free text; archives write single years as well as ranges like `1875-1880`.
    pub year: String,
    pub description: String,
}

/// A case title match together with the path needed to open it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaseHit {
    pub fund_id: String,
    pub inventory_id: String,
    pub case_id: String,
    pub title: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NewFund {
    pub name: String,
    pub number: String,
    pub description: String,
    pub start_year: String,
    pub end_year: String,
}

impl NewFund {
    pub fn new(name: &str, number: &str, description: &str, start_year: &str, end_year: &str) -> Self {
        Self {
            name: name.to_string(),
            number: number.to_string(),
            description: description.to_string(),
            start_year: start_year.to_string(),
            end_year: end_year.to_string(),
        }
    }

    pub(crate) fn validate(&self) -> Result<(), AppResponse> {
        require("name", &self.name)?;
        check_year_range(&self.start_year, &self.end_year)
    }

    pub(crate) fn into_fund(self, id: String) -> Fund {
        Fund {
            id,
            name: self.name,
            number: self.number,
            description: self.description,
            start_year: self.start_year,
            end_year: self.end_year,
            inventories: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FundUpdate {
    pub name: Option<String>,
    pub number: Option<String>,
    pub description: Option<String>,
    pub start_year: Option<String>,
    pub end_year: Option<String>,
}

impl FundUpdate {
    pub(crate) fn apply(self, fund: &mut Fund) -> Result<(), AppResponse> {
        if let Some(name) = &self.name {
            require("name", name)?;
        }
        let start = self.start_year.as_deref().unwrap_or(&fund.start_year);
        let end = self.end_year.as_deref().unwrap_or(&fund.end_year);
        check_year_range(start, end)?;

        merge(&mut fund.name, self.name);
        merge(&mut fund.number, self.number);
        merge(&mut fund.description, self.description);
        merge(&mut fund.start_year, self.start_year);
        merge(&mut fund.end_year, self.end_year);
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NewInventory {
    pub title: String,
    pub number: String,
    pub description: String,
}

impl NewInventory {
    pub fn new(title: &str, number: &str, description: &str) -> Self {
        Self {
            title: title.to_string(),
            number: number.to_string(),
            description: description.to_string(),
        }
    }

    pub(crate) fn validate(&self) -> Result<(), AppResponse> {
        require("title", &self.title)
    }

    pub(crate) fn into_inventory(self, id: String) -> Inventory {
        Inventory {
            id,
            title: self.title,
            number: self.number,
            description: self.description,
            cases: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InventoryUpdate {
    pub title: Option<String>,
    pub number: Option<String>,
    pub description: Option<String>,
}

impl InventoryUpdate {
    pub(crate) fn apply(self, inventory: &mut Inventory) -> Result<(), AppResponse> {
        if let Some(title) = &self.title {
            require("title", title)?;
        }
        merge(&mut inventory.title, self.title);
        merge(&mut inventory.number, self.number);
        merge(&mut inventory.description, self.description);
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NewCase {
    pub title: String,
    pub number: String,
    pub year: String,
    pub description: String,
}

impl NewCase {
    pub fn new(title: &str, number: &str, year: &str, description: &str) -> Self {
        Self {
            title: title.to_string(),
            number: number.to_string(),
            year: year.to_string(),
            description: description.to_string(),
        }
    }

    pub(crate) fn validate(&self) -> Result<(), AppResponse> {
        require("title", &self.title)
    }

    pub(crate) fn into_case(self, id: String) -> Case {
        Case {
            id,
            title: self.title,
            number: self.number,
            year: self.year,
            description: self.description,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CaseUpdate {
    pub title: Option<String>,
    pub number: Option<String>,
    pub year: Option<String>,
    pub description: Option<String>,
}

impl CaseUpdate {
    pub(crate) fn apply(self, case: &mut Case) -> Result<(), AppResponse> {
        if let Some(title) = &self.title {
            require("title", title)?;
        }
        merge(&mut case.title, self.title);
        merge(&mut case.number, self.number);
        merge(&mut case.year, self.year);
        merge(&mut case.description, self.description);
        Ok(())
    }
}

fn merge(field: &mut String, value: Option<String>) {
    if let Some(value) = value {
        *field = value;
    }
}

pub(crate) fn require(field: &str, value: &str) -> Result<(), AppResponse> {
    if value.trim().is_empty() {
        return Err(AppResponse::ValidationError(format!("'{field}' is required")));
    }
    Ok(())
}

/// Only enforced when both ends are plain integers.
fn check_year_range(start: &str, end: &str) -> Result<(), AppResponse> {
    if let (Ok(s), Ok(e)) = (start.trim().parse::<i32>(), end.trim().parse::<i32>()) {
        if s > e {
            return Err(AppResponse::ValidationError(format!(
                "start year {s} is after end year {e}"
            )));
        }
    }
    Ok(())
}
