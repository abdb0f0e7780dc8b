pub mod anomaly;
pub mod city;
