pub mod city;
pub mod period;
pub mod trip_batch;
