pub mod sheet_seed;
