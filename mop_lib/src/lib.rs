pub mod figure;
pub mod kpi;
pub mod map_renderer;
pub mod region;
pub mod trip;
