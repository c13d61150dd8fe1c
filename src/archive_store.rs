//! Entity tree store.
//!
//! Every mutation follows the same steps: authorize, resolve the parent path, validate,
//! apply the change to a clone of the tree, persist the clone under [`FUNDS_KEY`], then
//! swap it in. A denied, invalid or unpersisted change leaves both the stored and
//! in-memory tree exactly as they were.

use log::{debug, info};
use uuid::Uuid;

use crate::app_response::AppResponse;
use crate::archive_model::{
    Case, CaseHit, CaseUpdate, Fund, FundUpdate, Inventory, InventoryUpdate, NewCase, NewFund,
    NewInventory,
};
use crate::key_value_store::{load_or_default, write_json, SharedStore, FUNDS_KEY};
use crate::permission::{authorize, Permission};
use crate::sample_data::sample_funds;
use crate::user_model::User;

pub struct ArchiveStore {
    storage: SharedStore,
    funds: Vec<Fund>,
}

impl ArchiveStore {
    pub fn load(storage: SharedStore, seed_sample_data: bool) -> Result<Self, AppResponse> {
        let funds = load_or_default(storage.as_ref(), FUNDS_KEY, || {
            if seed_sample_data {
                info!("Seeding archive with sample funds");
                sample_funds()
            } else {
                Vec::new()
            }
        })?;
        info!("Loaded {} funds", funds.len());
        Ok(Self { storage, funds })
    }

    pub fn funds(&self) -> &[Fund] {
        &self.funds
    }

    pub fn fund(&self, fund_id: &str) -> Option<&Fund> {
        self.funds.iter().find(|f| f.id == fund_id)
    }

    pub fn inventory(&self, fund_id: &str, inventory_id: &str) -> Option<&Inventory> {
        self.fund(fund_id)?
            .inventories
            .iter()
            .find(|i| i.id == inventory_id)
    }

    pub fn case(&self, fund_id: &str, inventory_id: &str, case_id: &str) -> Option<&Case> {
        self.inventory(fund_id, inventory_id)?
            .cases
            .iter()
            .find(|c| c.id == case_id)
    }

    /// Case-insensitive substring match over case titles, in tree order.
    pub fn search_cases(&self, query: &str) -> Vec<CaseHit> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return Vec::new();
        }

        let mut hits = Vec::new();
        for fund in &self.funds {
            for inventory in &fund.inventories {
                for case in &inventory.cases {
                    if case.title.to_lowercase().contains(&needle) {
                        hits.push(CaseHit {
                            fund_id: fund.id.clone(),
                            inventory_id: inventory.id.clone(),
                            case_id: case.id.clone(),
                            title: case.title.clone(),
                        });
                    }
                }
            }
        }
        hits
    }

    pub fn create_fund(&mut self, actor: Option<&User>, new: NewFund) -> Result<String, AppResponse> {
        authorize(actor, Permission::EditDocument)?;
        new.validate()?;

        let id = Uuid::new_v4().to_string();
        let mut funds = self.funds.clone();
        funds.push(new.into_fund(id.clone()));
        self.commit(funds)?;

        info!("Fund {id} created");
        Ok(id)
    }

    pub fn update_fund(
        &mut self,
        actor: Option<&User>,
        fund_id: &str,
        update: FundUpdate,
    ) -> Result<Fund, AppResponse> {
        authorize(actor, Permission::EditDocument)?;

        let mut funds = self.funds.clone();
        let fund = find_fund_mut(&mut funds, fund_id)?;
        update.apply(fund)?;
        let updated = fund.clone();
        self.commit(funds)?;

        Ok(updated)
    }

    pub fn delete_fund(&mut self, actor: Option<&User>, fund_id: &str) -> Result<Fund, AppResponse> {
        authorize(actor, Permission::DeleteDocument)?;

        let mut funds = self.funds.clone();
        let index = funds
            .iter()
            .position(|f| f.id == fund_id)
            .ok_or_else(|| AppResponse::not_found("Fund", fund_id))?;
        let removed = funds.remove(index);
        self.commit(funds)?;

        info!("Fund {fund_id} deleted with {} inventories", removed.inventories.len());
        Ok(removed)
    }

    pub fn create_inventory(
        &mut self,
        actor: Option<&User>,
        fund_id: &str,
        new: NewInventory,
    ) -> Result<String, AppResponse> {
        authorize(actor, Permission::EditDocument)?;

        let mut funds = self.funds.clone();
        let fund = find_fund_mut(&mut funds, fund_id)?;
        new.validate()?;
        let id = Uuid::new_v4().to_string();
        fund.inventories.push(new.into_inventory(id.clone()));
        self.commit(funds)?;

        info!("Inventory {id} created in fund {fund_id}");
        Ok(id)
    }

    pub fn update_inventory(
        &mut self,
        actor: Option<&User>,
        fund_id: &str,
        inventory_id: &str,
        update: InventoryUpdate,
    ) -> Result<Inventory, AppResponse> {
        authorize(actor, Permission::EditDocument)?;

        let mut funds = self.funds.clone();
        let inventory = find_inventory_mut(&mut funds, fund_id, inventory_id)?;
        update.apply(inventory)?;
        let updated = inventory.clone();
        self.commit(funds)?;

        Ok(updated)
    }

    pub fn delete_inventory(
        &mut self,
        actor: Option<&User>,
        fund_id: &str,
        inventory_id: &str,
    ) -> Result<Inventory, AppResponse> {
        authorize(actor, Permission::DeleteDocument)?;

        let mut funds = self.funds.clone();
        let fund = find_fund_mut(&mut funds, fund_id)?;
        let index = fund
            .inventories
            .iter()
            .position(|i| i.id == inventory_id)
            .ok_or_else(|| AppResponse::not_found("Inventory", inventory_id))?;
        let removed = fund.inventories.remove(index);
        self.commit(funds)?;

        info!("Inventory {inventory_id} deleted from fund {fund_id}");
        Ok(removed)
    }

    pub fn create_case(
        &mut self,
        actor: Option<&User>,
        fund_id: &str,
        inventory_id: &str,
        new: NewCase,
    ) -> Result<String, AppResponse> {
        authorize(actor, Permission::EditDocument)?;

        let mut funds = self.funds.clone();
        let inventory = find_inventory_mut(&mut funds, fund_id, inventory_id)?;
        new.validate()?;
        let id = Uuid::new_v4().to_string();
        inventory.cases.push(new.into_case(id.clone()));
        self.commit(funds)?;

        info!("Case {id} created in inventory {inventory_id}");
        Ok(id)
    }

    pub fn update_case(
        &mut self,
        actor: Option<&User>,
        fund_id: &str,
        inventory_id: &str,
        case_id: &str,
        update: CaseUpdate,
    ) -> Result<Case, AppResponse> {
        authorize(actor, Permission::EditDocument)?;

        let mut funds = self.funds.clone();
        let inventory = find_inventory_mut(&mut funds, fund_id, inventory_id)?;
        let case = inventory
            .cases
            .iter_mut()
            .find(|c| c.id == case_id)
            .ok_or_else(|| AppResponse::not_found("Case", case_id))?;
        update.apply(case)?;
        let updated = case.clone();
        self.commit(funds)?;

        Ok(updated)
    }

    pub fn delete_case(
        &mut self,
        actor: Option<&User>,
        fund_id: &str,
        inventory_id: &str,
        case_id: &str,
    ) -> Result<Case, AppResponse> {
        authorize(actor, Permission::DeleteDocument)?;

        let mut funds = self.funds.clone();
        let inventory = find_inventory_mut(&mut funds, fund_id, inventory_id)?;
        let index = inventory
            .cases
            .iter()
            .position(|c| c.id == case_id)
            .ok_or_else(|| AppResponse::not_found("Case", case_id))?;
        let removed = inventory.cases.remove(index);
        self.commit(funds)?;

        info!("Case {case_id} deleted from inventory {inventory_id}");
        Ok(removed)
    }

    fn commit(&mut self, funds: Vec<Fund>) -> Result<(), AppResponse> {
        write_json(self.storage.as_ref(), FUNDS_KEY, &funds)?;
        debug!("Fund tree persisted ({} funds)", funds.len());
        self.funds = funds;
        Ok(())
    }
}

fn find_fund_mut<'a>(funds: &'a mut [Fund], fund_id: &str) -> Result<&'a mut Fund, AppResponse> {
    funds
        .iter_mut()
        .find(|f| f.id == fund_id)
        .ok_or_else(|| AppResponse::not_found("Fund", fund_id))
}

fn find_inventory_mut<'a>(
    funds: &'a mut [Fund],
    fund_id: &str,
    inventory_id: &str,
) -> Result<&'a mut Inventory, AppResponse> {
    find_fund_mut(funds, fund_id)?
        .inventories
        .iter_mut()
        .find(|i| i.id == inventory_id)
        .ok_or_else(|| AppResponse::not_found("Inventory", inventory_id))
}
