// Application Constants
// Centralized constants to avoid magic numbers

/// QR payload prefix
pub const QR_PREFIX: &str = "QR-";

/// Transaction id prefix
pub const TX_PREFIX: &str = "TX";

/// Batch id prefix and random suffix length
pub const BATCH_ID_PREFIX: &str = "BATCH";
pub const BATCH_ID_SUFFIX_LEN: usize = 5;

/// Synthetic ledger timeline start (RFC 3339)
pub const DEFAULT_LEDGER_BASE_DATE: &str = "2024-01-01T00:00:00Z";

/// Mock chain confirmation defaults
pub const DEFAULT_CHAIN_MIN_LATENCY_MS: u64 = 500;
pub const DEFAULT_CHAIN_MAX_LATENCY_MS: u64 = 2000;
pub const DEFAULT_CHAIN_FAILURE_RATE: f64 = 0.0;

/// Demo operator credentials
pub const DEFAULT_OPERATOR_ID: &str = "ADMIN001";
pub const DEFAULT_OPERATOR_PASSCODE: &str = "medchain-demo";

/// Display timezone for rendered timestamps
pub const DEFAULT_DISPLAY_TIMEZONE: &str = "Asia/Kolkata";

/// Known production sites per manufacturer
pub const MANUFACTURER_SITES: &[(&str, &[&str])] = &[
    ("Dr. Reddy's", &["Mumbai", "Chennai"]),
    ("Sun Pharma", &["Hyderabad", "Ahmedabad"]),
    ("Cipla Ltd", &["Goa", "Bangalore"]),
    ("Lupin Ltd", &["Pune", "Aurangabad"]),
    ("Aurobindo Pharma", &["Hyderabad", "Vizag"]),
];

/// Production sites for a manufacturer, if it is a known one
pub fn manufacturer_sites(manufacturer: &str) -> Option<&'static [&'static str]> {
    MANUFACTURER_SITES
        .iter()
        .find(|(name, _)| *name == manufacturer)
        .map(|(_, sites)| *sites)
}

/// Demand forecasting tables. Factors are in tenths.
pub const DRUG_BASE_DEMAND: &[(&str, u32)] = &[
    ("Paracetamol 500mg", 150),
    ("Amoxicillin 250mg", 80),
    ("Metformin 500mg", 120),
    ("Aspirin 75mg", 90),
    ("Omeprazole 20mg", 70),
];
/// January through December; winter and monsoon peaks
pub const SEASONAL_FACTORS: [u32; 12] = [18, 16, 13, 12, 11, 20, 22, 21, 19, 14, 13, 17];
pub const RURAL_DEMAND_FACTOR: u32 = 15;
pub const URBAN_DEMAND_FACTOR: u32 = 10;
pub const MONSOON_MONTHS: std::ops::RangeInclusive<u32> = 6..=9;
pub const OUTBREAK_DRUGS: &[&str] = &["Paracetamol 500mg", "Amoxicillin 250mg"];
pub const OUTBREAK_FACTOR: u32 = 15;
pub const MIN_FORECAST_DEMAND: u32 = 10;

/// Emergency ids for patients without an Aadhaar number: EMG001..=EMG020
pub const EMERGENCY_ID_PREFIX: &str = "EMG";
pub const EMERGENCY_ID_MAX: u32 = 20;

/// Response messages
pub const MSG_INVALID_CODE: &str = "Invalid QR code";
pub const MSG_UNAUTHORIZED: &str = "Invalid operator credentials";
