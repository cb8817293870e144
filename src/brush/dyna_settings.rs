//! Dynadraw paint-op settings
//!
//! The dynadraw brush exposes a handful of "uniform" properties (diameter,
//! angle, mass, drag, shape) next to the standard opacity and flow. Each
//! property has a read handler that re-derives its displayed value from the
//! option state and a write handler that stores a new value back. Whoever
//! shows the properties subscribes to change notifications and re-reads.

use crate::error::{Result, StabilizerError};

/// Shape drawn by the dynadraw brush
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DynaShape {
    #[default]
    Circle,
    Polygon,
    Wire,
    Lines,
}

impl DynaShape {
    pub const ALL: [DynaShape; 4] = [
        DynaShape::Circle,
        DynaShape::Polygon,
        DynaShape::Wire,
        DynaShape::Lines,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            DynaShape::Circle => "Circle",
            DynaShape::Polygon => "Polygon",
            DynaShape::Wire => "Wire",
            DynaShape::Lines => "Lines",
        }
    }

    pub fn index(&self) -> usize {
        match self {
            DynaShape::Circle => 0,
            DynaShape::Polygon => 1,
            DynaShape::Wire => 2,
            DynaShape::Lines => 3,
        }
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }
}

/// How paint from a stroke is applied to the layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PaintActionType {
    /// Stroke is composited once, opacity acts as a ceiling
    #[default]
    Wash,
    /// Dabs accumulate directly on the layer
    Buildup,
}

/// Option state behind the dynadraw properties
#[derive(Debug, Clone, PartialEq)]
pub struct DynaOptions {
    /// Brush diameter in pixels
    pub diameter: i32,
    /// Fixed angle in degrees, used when `use_fixed_angle` is set
    pub angle: i32,
    pub use_fixed_angle: bool,
    /// Pen mass of the dynamics model
    pub mass: f64,
    /// Drag (friction) of the dynamics model
    pub drag: f64,
    pub shape: DynaShape,
    pub paint_action: PaintActionType,
    pub airbrush_enabled: bool,
    /// Airbrush rate in dabs per second
    pub airbrush_rate: i32,
    pub opacity: f64,
    pub flow: f64,
}

impl Default for DynaOptions {
    fn default() -> Self {
        Self {
            diameter: 25,
            angle: 0,
            use_fixed_angle: false,
            mass: 0.5,
            drag: 0.15,
            shape: DynaShape::Circle,
            paint_action: PaintActionType::Wash,
            airbrush_enabled: false,
            airbrush_rate: 20,
            opacity: 1.0,
            flow: 1.0,
        }
    }
}

/// Editing widget hint and value domain of a property
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyKind {
    IntSlider {
        min: i32,
        max: i32,
        step: i32,
        suffix: &'static str,
    },
    DoubleSlider {
        min: f64,
        max: f64,
        step: f64,
        decimals: u32,
        exponent_ratio: f64,
    },
    Combo {
        items: Vec<&'static str>,
    },
}

/// Value carried by a property read or write
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PropertyValue {
    Int(i32),
    Double(f64),
    /// Selected combo item
    Index(usize),
}

/// Snapshot of one property as the property panel should show it
#[derive(Debug, Clone, PartialEq)]
pub struct UniformProperty {
    pub id: &'static str,
    pub name: &'static str,
    pub kind: PropertyKind,
    pub value: PropertyValue,
    pub visible: bool,
}

/// Handle returned by [`DynaPaintOpSettings::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type ReadFn = fn(&DynaOptions) -> PropertyValue;
type WriteFn = fn(&mut DynaOptions, PropertyValue);
type VisibleFn = fn(&DynaOptions) -> bool;
type Observer = Box<dyn FnMut(&DynaOptions)>;

struct PropertySpec {
    id: &'static str,
    name: &'static str,
    kind: fn() -> PropertyKind,
    read: ReadFn,
    write: WriteFn,
    visible: VisibleFn,
}

fn always(_: &DynaOptions) -> bool {
    true
}

fn fraction_slider() -> PropertyKind {
    PropertyKind::DoubleSlider {
        min: 0.0,
        max: 1.0,
        step: 0.01,
        decimals: 2,
        exponent_ratio: 1.0,
    }
}

// Standard properties come first, then the dynadraw-specific ones
static PROPERTIES: &[PropertySpec] = &[
    PropertySpec {
        id: "opacity",
        name: "Opacity",
        kind: fraction_slider,
        read: |o| PropertyValue::Double(o.opacity),
        write: |o, v| {
            if let PropertyValue::Double(v) = v {
                o.opacity = v;
            }
        },
        visible: always,
    },
    PropertySpec {
        id: "flow",
        name: "Flow",
        kind: fraction_slider,
        read: |o| PropertyValue::Double(o.flow),
        write: |o, v| {
            if let PropertyValue::Double(v) = v {
                o.flow = v;
            }
        },
        visible: always,
    },
    PropertySpec {
        id: "dyna_diameter",
        name: "Diameter",
        kind: || PropertyKind::IntSlider {
            min: 0,
            max: 1000,
            step: 1,
            suffix: " px",
        },
        read: |o| PropertyValue::Int(o.diameter),
        write: |o, v| {
            if let PropertyValue::Int(v) = v {
                o.diameter = v;
            }
        },
        visible: always,
    },
    PropertySpec {
        id: "dyna_angle",
        name: "Angle",
        kind: || PropertyKind::IntSlider {
            min: 0,
            max: 360,
            step: 1,
            suffix: "°",
        },
        read: |o| PropertyValue::Int(o.angle),
        write: |o, v| {
            if let PropertyValue::Int(v) = v {
                o.angle = v;
            }
        },
        visible: |o| o.use_fixed_angle,
    },
    PropertySpec {
        id: "dyna_mass",
        name: "Mass",
        kind: || PropertyKind::DoubleSlider {
            min: 0.01,
            max: 3.0,
            step: 0.01,
            decimals: 2,
            exponent_ratio: 3.0,
        },
        read: |o| PropertyValue::Double(o.mass),
        write: |o, v| {
            if let PropertyValue::Double(v) = v {
                o.mass = v;
            }
        },
        visible: always,
    },
    PropertySpec {
        id: "dyna_drag",
        name: "Drag",
        kind: || PropertyKind::DoubleSlider {
            min: 0.0,
            max: 0.99,
            step: 0.01,
            decimals: 2,
            exponent_ratio: 3.0,
        },
        read: |o| PropertyValue::Double(o.drag),
        write: |o, v| {
            if let PropertyValue::Double(v) = v {
                o.drag = v;
            }
        },
        visible: always,
    },
    PropertySpec {
        id: "dyna_shape",
        name: "Shape",
        kind: || PropertyKind::Combo {
            items: DynaShape::ALL.iter().map(DynaShape::name).collect(),
        },
        read: |o| PropertyValue::Index(o.shape.index()),
        write: |o, v| {
            if let Some(shape) = match v {
                PropertyValue::Index(i) => DynaShape::from_index(i),
                _ => None,
            } {
                o.shape = shape;
            }
        },
        visible: always,
    },
];

/// Settings of the dynadraw paint op with change notification
pub struct DynaPaintOpSettings {
    options: DynaOptions,
    observers: Vec<(SubscriptionId, Observer)>,
    next_subscription: u64,
}

impl DynaPaintOpSettings {
    pub fn new(options: DynaOptions) -> Self {
        Self {
            options,
            observers: Vec::new(),
            next_subscription: 0,
        }
    }

    pub fn options(&self) -> &DynaOptions {
        &self.options
    }

    /// Whether dabs build up on the layer instead of washing
    pub fn paint_incremental(&self) -> bool {
        self.options.paint_action == PaintActionType::Buildup
    }

    pub fn is_airbrushing(&self) -> bool {
        self.options.airbrush_enabled
    }

    /// Airbrush rate in dabs per second
    pub fn rate(&self) -> i32 {
        self.options.airbrush_rate
    }

    /// All properties with values freshly read from the options
    pub fn uniform_properties(&self) -> Vec<UniformProperty> {
        PROPERTIES
            .iter()
            .map(|spec| self.read_spec(spec))
            .collect()
    }

    /// Read a single property by id
    pub fn read_property(&self, id: &str) -> Result<UniformProperty> {
        find_spec(id).map(|spec| self.read_spec(spec))
    }

    /// Validate and store a property value, then notify observers
    pub fn write_property(&mut self, id: &str, value: PropertyValue) -> Result<()> {
        let spec = find_spec(id)?;

        if let Err(err) = check_value(spec.id, &(spec.kind)(), value) {
            tracing::warn!("[DynaSettings] Rejected write to {}: {}", id, err);
            return Err(err);
        }

        (spec.write)(&mut self.options, value);
        tracing::debug!("[DynaSettings] {} = {:?}", id, value);
        self.notify();
        Ok(())
    }

    /// Apply an external change to the options and notify observers
    pub fn update(&mut self, change: impl FnOnce(&mut DynaOptions)) {
        change(&mut self.options);
        self.notify();
    }

    /// Register a callback run after every options change
    pub fn subscribe(&mut self, observer: impl FnMut(&DynaOptions) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.observers.push((id, Box::new(observer)));
        id
    }

    /// Returns whether the subscription existed
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(sub, _)| *sub != id);
        self.observers.len() != before
    }

    fn read_spec(&self, spec: &PropertySpec) -> UniformProperty {
        UniformProperty {
            id: spec.id,
            name: spec.name,
            kind: (spec.kind)(),
            value: (spec.read)(&self.options),
            visible: (spec.visible)(&self.options),
        }
    }

    fn notify(&mut self) {
        let options = &self.options;
        for (_, observer) in &mut self.observers {
            observer(options);
        }
    }
}

impl Default for DynaPaintOpSettings {
    fn default() -> Self {
        Self::new(DynaOptions::default())
    }
}

fn find_spec(id: &str) -> Result<&'static PropertySpec> {
    PROPERTIES
        .iter()
        .find(|spec| spec.id == id)
        .ok_or_else(|| StabilizerError::UnknownProperty(id.to_string()))
}

fn check_value(id: &str, kind: &PropertyKind, value: PropertyValue) -> Result<()> {
    let (value, min, max) = match (kind, value) {
        (PropertyKind::IntSlider { min, max, .. }, PropertyValue::Int(v)) => {
            (f64::from(v), f64::from(*min), f64::from(*max))
        }
        (PropertyKind::DoubleSlider { min, max, .. }, PropertyValue::Double(v)) => (v, *min, *max),
        (PropertyKind::Combo { items }, PropertyValue::Index(i)) => {
            (i as f64, 0.0, items.len().saturating_sub(1) as f64)
        }
        (kind, _) => {
            let expected = match kind {
                PropertyKind::IntSlider { .. } => "integer",
                PropertyKind::DoubleSlider { .. } => "floating point",
                PropertyKind::Combo { .. } => "combo index",
            };
            return Err(StabilizerError::PropertyTypeMismatch {
                id: id.to_string(),
                expected,
            });
        }
    };

    if !(min..=max).contains(&value) {
        return Err(StabilizerError::PropertyOutOfRange {
            id: id.to_string(),
            value,
            min,
            max,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_property_order() {
        let settings = DynaPaintOpSettings::default();
        let ids: Vec<&str> = settings.uniform_properties().iter().map(|p| p.id).collect();
        assert_eq!(
            ids,
            vec![
                "opacity",
                "flow",
                "dyna_diameter",
                "dyna_angle",
                "dyna_mass",
                "dyna_drag",
                "dyna_shape"
            ]
        );
    }

    #[test]
    fn test_read_reflects_options() -> Result<()> {
        let settings = DynaPaintOpSettings::new(DynaOptions {
            diameter: 120,
            shape: DynaShape::Wire,
            ..Default::default()
        });

        assert_eq!(
            settings.read_property("dyna_diameter")?.value,
            PropertyValue::Int(120)
        );
        assert_eq!(
            settings.read_property("dyna_shape")?.value,
            PropertyValue::Index(2)
        );
        Ok(())
    }

    #[test]
    fn test_angle_visible_only_with_fixed_angle() -> Result<()> {
        let mut settings = DynaPaintOpSettings::default();
        assert!(!settings.read_property("dyna_angle")?.visible);

        settings.update(|o| o.use_fixed_angle = true);
        assert!(settings.read_property("dyna_angle")?.visible);
        Ok(())
    }

    #[test]
    fn test_write_updates_options() -> Result<()> {
        let mut settings = DynaPaintOpSettings::default();
        settings.write_property("dyna_mass", PropertyValue::Double(1.25))?;
        settings.write_property("dyna_shape", PropertyValue::Index(3))?;

        assert_eq!(settings.options().mass, 1.25);
        assert_eq!(settings.options().shape, DynaShape::Lines);
        Ok(())
    }

    #[test]
    fn test_write_out_of_range_rejected() {
        let mut settings = DynaPaintOpSettings::default();

        let result = settings.write_property("dyna_drag", PropertyValue::Double(1.0));
        assert!(matches!(
            result,
            Err(StabilizerError::PropertyOutOfRange { .. })
        ));

        let result = settings.write_property("dyna_diameter", PropertyValue::Int(1001));
        assert!(matches!(
            result,
            Err(StabilizerError::PropertyOutOfRange { .. })
        ));

        let result = settings.write_property("dyna_shape", PropertyValue::Index(4));
        assert!(matches!(
            result,
            Err(StabilizerError::PropertyOutOfRange { .. })
        ));

        assert_eq!(settings.options(), &DynaOptions::default());
    }

    #[test]
    fn test_write_wrong_type_rejected() {
        let mut settings = DynaPaintOpSettings::default();
        let result = settings.write_property("dyna_diameter", PropertyValue::Double(10.0));
        assert!(matches!(
            result,
            Err(StabilizerError::PropertyTypeMismatch {
                expected: "integer",
                ..
            })
        ));
    }

    #[test]
    fn test_write_unknown_property() {
        let mut settings = DynaPaintOpSettings::default();
        let result = settings.write_property("dyna_width", PropertyValue::Int(1));
        assert!(matches!(result, Err(StabilizerError::UnknownProperty(_))));
    }

    #[test]
    fn test_observers_notified() -> Result<()> {
        let mut settings = DynaPaintOpSettings::default();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        let id = settings.subscribe(move |o| sink.borrow_mut().push(o.diameter));

        settings.write_property("dyna_diameter", PropertyValue::Int(40))?;
        settings.update(|o| o.diameter = 60);
        assert_eq!(*seen.borrow(), vec![40, 60]);

        assert!(settings.unsubscribe(id));
        assert!(!settings.unsubscribe(id));
        settings.update(|o| o.diameter = 80);
        assert_eq!(seen.borrow().len(), 2);
        Ok(())
    }

    #[test]
    fn test_rejected_write_does_not_notify() {
        let mut settings = DynaPaintOpSettings::default();
        let count = Rc::new(RefCell::new(0));
        let sink = count.clone();
        settings.subscribe(move |_| *sink.borrow_mut() += 1);

        let _ = settings.write_property("dyna_mass", PropertyValue::Double(0.0));
        assert_eq!(*count.borrow(), 0);
    }

    #[test]
    fn test_paint_action_and_airbrush() {
        let mut settings = DynaPaintOpSettings::default();
        assert!(!settings.paint_incremental());
        assert!(!settings.is_airbrushing());

        settings.update(|o| {
            o.paint_action = PaintActionType::Buildup;
            o.airbrush_enabled = true;
            o.airbrush_rate = 50;
        });
        assert!(settings.paint_incremental());
        assert!(settings.is_airbrushing());
        assert_eq!(settings.rate(), 50);
    }

    #[test]
    fn test_shape_index_round_trip() {
        for shape in DynaShape::ALL {
            assert_eq!(DynaShape::from_index(shape.index()), Some(shape));
        }
        assert_eq!(DynaShape::from_index(4), None);
    }
}
