//! In-crate test support: a reference in-memory engine able to execute
//! compiled descriptors against fixture data, plus the world fixture
//! (countries → provinces → cities) used by scenario tests.

mod memory;

pub(crate) use fixtures::{
    City, Country, Province, WorldIds, seed_city, seed_country, seed_province, seed_world,
    world_schema,
};
pub(crate) use memory::{EntitySchema, FieldSchema, MemoryEngine};
