pub mod piece;
pub mod rules;
pub mod side;
pub mod tower;
