use tracing::debug;

use crate::constants::{
    DRUG_BASE_DEMAND, MIN_FORECAST_DEMAND, MONSOON_MONTHS, OUTBREAK_DRUGS, OUTBREAK_FACTOR,
    RURAL_DEMAND_FACTOR, SEASONAL_FACTORS, URBAN_DEMAND_FACTOR,
};
use crate::models::{DemandForecast, LocationType};

/// Monthly demand for a drug at a kind of location.
///
/// `base demand x seasonal factor x regional factor`, floored at a minimum.
/// Monsoon months also carry an outbreak figure for fever and infection
/// drugs. Unknown drugs and months outside 1..=12 have no forecast.
pub fn forecast_demand(drug_name: &str, month: u32, location_type: LocationType) -> Option<DemandForecast> {
    let base = DRUG_BASE_DEMAND
        .iter()
        .find(|(name, _)| *name == drug_name)
        .map(|(_, base)| *base)?;
    let seasonal = *SEASONAL_FACTORS.get(month.checked_sub(1)? as usize)?;
    let regional = match location_type {
        LocationType::Rural => RURAL_DEMAND_FACTOR,
        LocationType::Urban => URBAN_DEMAND_FACTOR,
    };

    let expected_demand = (base * seasonal * regional / 100).max(MIN_FORECAST_DEMAND);
    let outbreak_demand = if MONSOON_MONTHS.contains(&month) && OUTBREAK_DRUGS.contains(&drug_name) {
        expected_demand * OUTBREAK_FACTOR / 10
    } else {
        expected_demand
    };

    debug!(drug = drug_name, month, ?location_type, expected_demand, outbreak_demand, "demand forecast");
    Some(DemandForecast {
        drug_name: drug_name.to_string(),
        month,
        location_type,
        expected_demand,
        outbreak_demand,
    })
}
