// Domain layer: statement models, rules and ports. No I/O beyond reading a
// rules file.

pub mod model;
pub mod ports;
pub mod rules;
pub mod summary;
