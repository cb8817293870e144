//! Brush module - paint-op settings exposed to the property panel

pub mod dyna_settings;

pub use dyna_settings::{
    DynaOptions, DynaPaintOpSettings, DynaShape, PaintActionType, PropertyKind, PropertyValue,
    SubscriptionId, UniformProperty,
};
