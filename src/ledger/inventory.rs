use std::collections::HashMap;
use tracing::{info, warn};

use crate::ledger::forecast::forecast_demand;
use crate::models::{DemandForecast, InventoryAlert, LedgerError, LedgerResult, StockLevel};

/// Stock levels keyed by (location, drug name)
#[derive(Debug, Clone, Default)]
pub struct InventoryBook {
    levels: HashMap<(String, String), StockLevel>,
}

impl InventoryBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_level(&mut self, level: StockLevel) {
        let key = (level.location.clone(), level.drug_name.clone());
        self.levels.insert(key, level);
    }

    pub fn level(&self, location: &str, drug_name: &str) -> Option<&StockLevel> {
        self.levels.get(&(location.to_string(), drug_name.to_string()))
    }

    /// Untracked pairs are unconstrained
    pub fn check_available(&self, location: &str, drug_name: &str, quantity: u32) -> LedgerResult<()> {
        match self.level(location, drug_name) {
            Some(level) if level.current_stock < quantity => Err(LedgerError::InsufficientStock {
                requested: quantity,
                available: level.current_stock,
            }),
            _ => Ok(()),
        }
    }

    /// Forecast for a tracked level, using its location type
    pub fn forecast(&self, location: &str, drug_name: &str, month: u32) -> Option<DemandForecast> {
        let level = self.level(location, drug_name)?;
        forecast_demand(drug_name, month, level.location_type)
    }

    /// Take stock out. `month` (1..=12) sizes the reorder advice on low stock.
    pub fn withdraw(
        &mut self,
        location: &str,
        drug_name: &str,
        quantity: u32,
        month: u32,
    ) -> LedgerResult<Vec<InventoryAlert>> {
        self.check_available(location, drug_name, quantity)?;
        let Some(level) = self.levels.get_mut(&(location.to_string(), drug_name.to_string())) else {
            return Ok(Vec::new());
        };

        level.current_stock -= quantity;
        info!(location, drug = drug_name, quantity, remaining = level.current_stock, "Stock withdrawn");

        let alerts = stock_alerts(level, month);
        for alert in &alerts {
            warn!(location, drug = drug_name, "⚠️ {}", alert.message);
        }
        Ok(alerts)
    }

    pub fn restock(&mut self, location: &str, drug_name: &str, quantity: u32) -> Vec<InventoryAlert> {
        let Some(level) = self.levels.get_mut(&(location.to_string(), drug_name.to_string())) else {
            return Vec::new();
        };

        level.current_stock = level.current_stock.saturating_add(quantity);
        info!(location, drug = drug_name, quantity, stock = level.current_stock, "Stock received");

        if level.current_stock > level.max_capacity {
            vec![InventoryAlert::over_capacity(level)]
        } else {
            Vec::new()
        }
    }

    /// Current alerts across every tracked level, sorted by location then drug
    pub fn alerts(&self, month: u32) -> Vec<InventoryAlert> {
        let mut levels: Vec<&StockLevel> = self.levels.values().collect();
        levels.sort_by(|a, b| (&a.location, &a.drug_name).cmp(&(&b.location, &b.drug_name)));
        levels
            .into_iter()
            .flat_map(|level| {
                let mut alerts = stock_alerts(level, month);
                if level.current_stock > level.max_capacity {
                    alerts.push(InventoryAlert::over_capacity(level));
                }
                alerts
            })
            .collect()
    }
}

fn stock_alerts(level: &StockLevel, month: u32) -> Vec<InventoryAlert> {
    if level.current_stock == 0 {
        vec![InventoryAlert::out_of_stock(level)]
    } else if level.is_low() {
        let forecast = forecast_demand(&level.drug_name, month, level.location_type);
        vec![InventoryAlert::low_stock(level, forecast.as_ref())]
    } else {
        Vec::new()
    }
}
