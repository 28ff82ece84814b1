pub mod baseline;
pub mod criticality;
pub mod optimize;
pub mod util;
