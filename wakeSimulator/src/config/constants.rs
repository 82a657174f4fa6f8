// Cost reference values (NREL ATB 2023, offshore wind)
// capex and opex https://atb.nrel.gov/electricity/2023/index
// lifespans https://atb.nrel.gov/electricity/2023/definitions#costrecoveryperiod
pub const CAPEX_LOW_USD_PER_KW: f64 = 3150.0;
pub const CAPEX_HIGH_USD_PER_KW: f64 = 3901.0;
pub const OPEX_POINT_LOW: (f64, f64) = (0.29, 102.0);   // (capacity factor, USD/kW-yr)
pub const OPEX_POINT_HIGH: (f64, f64) = (0.46, 116.0);
pub const LIFESPAN_YEARS: f64 = 30.0;

// Fraction of the year lost to downtime at baseline turbulence
pub const DOWNTIME: f64 = 0.02;

// Time Constants
pub const HOURS_PER_YEAR: f64 = 8760.0;
pub const DAYS_PER_JULIAN_YEAR: f64 = 365.25;
pub const HOURS_PER_DAY: f64 = 24.0;

// Unit conversions
pub const WATTS_PER_GIGAWATT: f64 = 1e9;
pub const MWH_PER_GWH: f64 = 1000.0;
pub const USD_PER_MILLION: f64 = 1e6;

// Default wind grids
pub const WS_DEFAULT_MIN: f64 = 0.0;
pub const WS_DEFAULT_MAX: f64 = 30.0;
pub const WS_DEFAULT_STEP: f64 = 1.0;
pub const WD_DEFAULT_STEP: f64 = 15.0;
pub const FULL_CIRCLE_DEG: f64 = 360.0;

// Yaw optimization
pub const YAW_SCALE: f64 = 30.0;                // degrees per normalised unit
pub const INITIAL_YAW_DEG: f64 = 1.0;
pub const PHASE1_MAX_ITERS: u64 = 200;
pub const PHASE2_MAX_ITERS: u64 = 100;
pub const PHASE2_TOLERANCE: f64 = 1e-4;
pub const GRADIENT_TOLERANCE: f64 = 1e-5;
pub const LBFGS_MEMORY: usize = 7;

// Grid matching tolerance for wind speed / direction coordinates
pub const COORD_MATCH_TOLERANCE: f64 = 1e-9;

// Reference simulator defaults
pub const DEFAULT_N_CPU: usize = 1;
pub const ALL2ALL_MAX_ITERS: usize = 20;
pub const ALL2ALL_TOLERANCE: f64 = 1e-6;
pub const JIMENEZ_BETA: f64 = 0.1;
pub const GAUSSIAN_TI_SLOPE: f64 = 0.38;         // k = a * TI + b (Niayifar & Porte-Agel)
pub const GAUSSIAN_TI_OFFSET: f64 = 0.004;
pub const CGI_POINTS: usize = 7;

// Horns Rev 1 layout spacing
pub const HORNSREV_COLUMN_SPACING_M: f64 = 560.0; // eastward between columns
pub const HORNSREV_ROW_SPACING_M: f64 = 556.0;    // southward along a column
pub const HORNSREV_ROW_SKEW_M: f64 = 68.0;
pub const HORNSREV_ORIGIN_X: f64 = 423_974.0;
pub const HORNSREV_ORIGIN_Y: f64 = 6_151_447.0;
