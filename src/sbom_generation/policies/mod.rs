mod normalization_tables;

pub use normalization_tables::NormalizationTables;
