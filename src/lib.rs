#[allow(non_snake_case)]
pub mod Examples;
#[allow(non_snake_case)]
pub mod Kinetics;
#[allow(non_snake_case)]
pub mod KineticsIVP;
#[allow(non_snake_case)]
pub mod Reduction;
