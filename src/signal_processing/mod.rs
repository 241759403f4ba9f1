pub mod chain;
pub mod filter;
pub mod fir;
pub mod iir;
pub mod response;

pub use chain::{FilterChain, Stage, StageBuffer, StageStorage};
pub use filter::{Cascade, Filter};
pub use fir::FirFilter;
pub use iir::{IirFilter, normalize_coefficients};
pub use response::{
    fir_response, fir_response_f64, iir_response, magnitude_db, measure_gain_db,
};
