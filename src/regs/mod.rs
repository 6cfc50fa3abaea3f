pub mod ieee488;
