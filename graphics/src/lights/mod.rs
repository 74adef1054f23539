//! Light sources and the aggregate light environment.
//!
//! Analytic lights (directional, point, quad) and mesh-backed area lights
//! share one [`Light`] type dispatched by a closed variant set. Every
//! mutation bumps the light's version counter; a [`LightEnvironment`] uses
//! those counters to rebuild its packed GPU data at most once per change.

mod area;
mod data;
mod environment;
mod light;

pub use area::{create_area_lights, AreaSampling};
pub use data::{
    validate_light_layout, LightData, LightType, LIGHT_DATA_SIZE, MAX_LIGHT_SOURCES,
};
pub use environment::LightEnvironment;
pub use light::Light;
