use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocationType {
    Rural,
    Urban,
}

/// Stock of one drug at one location
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockLevel {
    pub location: String,
    pub drug_name: String,
    pub current_stock: u32,
    pub min_threshold: u32,
    pub max_capacity: u32,
    pub location_type: LocationType,
}

impl StockLevel {
    pub fn is_low(&self) -> bool {
        self.current_stock < self.min_threshold
    }
}

/// Expected monthly demand for a drug at a kind of location
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DemandForecast {
    pub drug_name: String,
    pub month: u32,
    pub location_type: LocationType,
    pub expected_demand: u32,
    /// Demand if a seasonal outbreak hits; equal to `expected_demand` otherwise
    pub outbreak_demand: u32,
}

impl DemandForecast {
    /// Stock to plan for: the outbreak figure when one is possible
    pub fn planned_demand(&self) -> u32 {
        self.expected_demand.max(self.outbreak_demand)
    }
}

/// Inventory alert raised by stock movements
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryAlert {
    pub alert_type: InventoryAlertType,
    pub location: String,
    pub drug_name: String,
    pub message: String,
    pub severity: AlertSeverity,
    pub recommended_action: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InventoryAlertType {
    OutOfStock,
    LowStock,
    OverCapacity,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlertSeverity {
    Critical, // Nothing left to dispense
    Warning,  // Replenish soon
    Info,
}

impl InventoryAlert {
    pub fn out_of_stock(level: &StockLevel) -> Self {
        Self {
            alert_type: InventoryAlertType::OutOfStock,
            location: level.location.clone(),
            drug_name: level.drug_name.clone(),
            message: format!("{} is out of stock at {}", level.drug_name, level.location),
            severity: AlertSeverity::Critical,
            recommended_action: Some("Request an emergency transfer from the nearest distributor".to_string()),
        }
    }

    pub fn low_stock(level: &StockLevel, forecast: Option<&DemandForecast>) -> Self {
        // Rural centres wait longer for deliveries
        let action = match level.location_type {
            LocationType::Rural => "Reorder now, rural delivery lead time applies",
            LocationType::Urban => "Consider replenishing stock soon",
        };
        let action = match forecast {
            Some(f) => format!(
                "{action}. Forecast demand this month is {} units, order at least {}",
                f.planned_demand(),
                f.planned_demand().saturating_sub(level.current_stock)
            ),
            None => action.to_string(),
        };
        Self {
            alert_type: InventoryAlertType::LowStock,
            location: level.location.clone(),
            drug_name: level.drug_name.clone(),
            message: format!(
                "Low stock: {} has only {} units remaining at {} (threshold {})",
                level.drug_name, level.current_stock, level.location, level.min_threshold
            ),
            severity: AlertSeverity::Warning,
            recommended_action: Some(action),
        }
    }

    pub fn over_capacity(level: &StockLevel) -> Self {
        Self {
            alert_type: InventoryAlertType::OverCapacity,
            location: level.location.clone(),
            drug_name: level.drug_name.clone(),
            message: format!(
                "{} at {} holds {} units, above capacity {}",
                level.drug_name, level.location, level.current_stock, level.max_capacity
            ),
            severity: AlertSeverity::Info,
            recommended_action: None,
        }
    }
}
