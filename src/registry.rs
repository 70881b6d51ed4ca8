//! Widget registry and framework base-class tables.
//!
//! The registry is built once from a static table and shared read-only by
//! every pipeline run, including runs on other threads.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Stability {
    Stable,
    Beta,
    Alpha,
    Dev,
    Deprecated,
}

/// Converter applied to a widget property value.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum PropertyType {
    Color,
    EdgeInsets,
    Alignment,
    TextStyle,
    Duration,
    Curve,
    Callback,
    Passthrough,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PropertySchema {
    pub name: String,
    pub ty: PropertyType,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub deprecated: bool,
    #[serde(default)]
    pub replacement: Option<String>,
}

impl PropertySchema {
    fn new(name: &str, ty: PropertyType) -> Self {
        PropertySchema {
            name: name.to_string(),
            ty,
            required: false,
            deprecated: false,
            replacement: None,
        }
    }

    fn required(name: &str, ty: PropertyType) -> Self {
        PropertySchema {
            required: true,
            ..PropertySchema::new(name, ty)
        }
    }

    fn deprecated(name: &str, ty: PropertyType, replacement: &str) -> Self {
        PropertySchema {
            deprecated: true,
            replacement: Some(replacement.to_string()),
            ..PropertySchema::new(name, ty)
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct WidgetEntry {
    pub name: String,
    /// Class name in the generated code.
    pub runtime_class: String,
    /// Runtime package exporting the class.
    pub module: String,
    pub stability: Stability,
    /// Positional constructor arguments, in order.
    #[serde(default)]
    pub positional: Vec<PropertySchema>,
    #[serde(default)]
    pub properties: Vec<PropertySchema>,
    /// Known limitations, reported for beta and alpha widgets.
    #[serde(default)]
    pub since: Option<String>,
    #[serde(default)]
    pub limitations: Vec<String>,
    #[serde(default)]
    pub replacement: Option<String>,
}

impl WidgetEntry {
    pub fn property(&self, name: &str) -> Option<&PropertySchema> {
        self.properties
            .iter()
            .chain(self.positional.iter())
            .find(|p| p.name == name)
    }

    pub fn required_properties(&self) -> impl Iterator<Item = &PropertySchema> {
        self.properties.iter().filter(|p| p.required)
    }
}

pub const MATERIAL_MODULE: &str = "@flutterjs/material";
pub const WIDGETS_MODULE: &str = "@flutterjs/widgets";

struct EntryBuilder {
    entry: WidgetEntry,
}

impl EntryBuilder {
    fn new(name: &str, module: &str) -> Self {
        EntryBuilder {
            entry: WidgetEntry {
                name: name.to_string(),
                runtime_class: name.to_string(),
                module: module.to_string(),
                stability: Stability::Stable,
                positional: vec![],
                properties: vec![PropertySchema::new("key", PropertyType::Passthrough)],
                since: None,
                limitations: vec![],
                replacement: None,
            },
        }
    }

    fn stability(mut self, stability: Stability, since: &str) -> Self {
        self.entry.stability = stability;
        self.entry.since = Some(since.to_string());
        self
    }

    fn replaced_by(mut self, replacement: &str) -> Self {
        self.entry.replacement = Some(replacement.to_string());
        self
    }

    fn limitation(mut self, text: &str) -> Self {
        self.entry.limitations.push(text.to_string());
        self
    }

    fn positional(mut self, name: &str, ty: PropertyType) -> Self {
        self.entry.positional.push(PropertySchema::required(name, ty));
        self
    }

    fn prop(mut self, name: &str, ty: PropertyType) -> Self {
        self.entry.properties.push(PropertySchema::new(name, ty));
        self
    }

    fn required(mut self, name: &str, ty: PropertyType) -> Self {
        self.entry.properties.push(PropertySchema::required(name, ty));
        self
    }

    fn deprecated_prop(mut self, name: &str, ty: PropertyType, replacement: &str) -> Self {
        self.entry
            .properties
            .push(PropertySchema::deprecated(name, ty, replacement));
        self
    }

    fn build(self) -> WidgetEntry {
        self.entry
    }
}

fn builtin_entries() -> Vec<WidgetEntry> {
    use PropertyType::*;
    let m = MATERIAL_MODULE;
    let w = WIDGETS_MODULE;
    vec![
        EntryBuilder::new("Text", m)
            .positional("data", Passthrough)
            .prop("style", TextStyle)
            .prop("textAlign", Passthrough)
            .prop("maxLines", Passthrough)
            .prop("overflow", Passthrough)
            .build(),
        EntryBuilder::new("Container", m)
            .prop("child", Passthrough)
            .prop("color", Color)
            .prop("padding", EdgeInsets)
            .prop("margin", EdgeInsets)
            .prop("alignment", Alignment)
            .prop("width", Passthrough)
            .prop("height", Passthrough)
            .prop("decoration", Passthrough)
            .prop("constraints", Passthrough)
            .build(),
        EntryBuilder::new("Padding", w)
            .required("padding", EdgeInsets)
            .prop("child", Passthrough)
            .build(),
        EntryBuilder::new("Center", w)
            .prop("child", Passthrough)
            .prop("widthFactor", Passthrough)
            .prop("heightFactor", Passthrough)
            .build(),
        EntryBuilder::new("Align", w)
            .prop("alignment", Alignment)
            .prop("child", Passthrough)
            .build(),
        EntryBuilder::new("Column", w)
            .prop("children", Passthrough)
            .prop("mainAxisAlignment", Passthrough)
            .prop("crossAxisAlignment", Passthrough)
            .prop("mainAxisSize", Passthrough)
            .build(),
        EntryBuilder::new("Row", w)
            .prop("children", Passthrough)
            .prop("mainAxisAlignment", Passthrough)
            .prop("crossAxisAlignment", Passthrough)
            .prop("mainAxisSize", Passthrough)
            .build(),
        EntryBuilder::new("SizedBox", w)
            .prop("width", Passthrough)
            .prop("height", Passthrough)
            .prop("child", Passthrough)
            .build(),
        EntryBuilder::new("Expanded", w)
            .required("child", Passthrough)
            .prop("flex", Passthrough)
            .build(),
        EntryBuilder::new("ListView", w)
            .prop("children", Passthrough)
            .prop("padding", EdgeInsets)
            .prop("scrollDirection", Passthrough)
            .prop("shrinkWrap", Passthrough)
            .build(),
        EntryBuilder::new("GestureDetector", w)
            .prop("child", Passthrough)
            .prop("onTap", Callback)
            .prop("onDoubleTap", Callback)
            .prop("onLongPress", Callback)
            .build(),
        EntryBuilder::new("Icon", m)
            .positional("icon", Passthrough)
            .prop("size", Passthrough)
            .prop("color", Color)
            .build(),
        EntryBuilder::new("Scaffold", m)
            .prop("appBar", Passthrough)
            .prop("body", Passthrough)
            .prop("floatingActionButton", Passthrough)
            .prop("drawer", Passthrough)
            .prop("bottomNavigationBar", Passthrough)
            .prop("backgroundColor", Color)
            .prop("resizeToAvoidBottomInset", Passthrough)
            .deprecated_prop("resizeToAvoidBottomPadding", Passthrough, "resizeToAvoidBottomInset")
            .build(),
        EntryBuilder::new("AppBar", m)
            .prop("title", Passthrough)
            .prop("actions", Passthrough)
            .prop("leading", Passthrough)
            .prop("backgroundColor", Color)
            .prop("elevation", Passthrough)
            .build(),
        EntryBuilder::new("ElevatedButton", m)
            .required("onPressed", Callback)
            .required("child", Passthrough)
            .prop("onLongPress", Callback)
            .prop("style", Passthrough)
            .build(),
        EntryBuilder::new("TextButton", m)
            .required("onPressed", Callback)
            .required("child", Passthrough)
            .prop("style", Passthrough)
            .build(),
        EntryBuilder::new("IconButton", m)
            .required("onPressed", Callback)
            .required("icon", Passthrough)
            .prop("tooltip", Passthrough)
            .prop("color", Color)
            .build(),
        EntryBuilder::new("FloatingActionButton", m)
            .required("onPressed", Callback)
            .prop("child", Passthrough)
            .prop("tooltip", Passthrough)
            .prop("backgroundColor", Color)
            .build(),
        EntryBuilder::new("MaterialApp", m)
            .prop("home", Passthrough)
            .prop("title", Passthrough)
            .prop("theme", Passthrough)
            .prop("routes", Passthrough)
            .prop("debugShowCheckedModeBanner", Passthrough)
            .build(),
        EntryBuilder::new("AnimatedContainer", m)
            .required("duration", Duration)
            .prop("curve", Curve)
            .prop("child", Passthrough)
            .prop("color", Color)
            .prop("padding", EdgeInsets)
            .prop("alignment", Alignment)
            .prop("width", Passthrough)
            .prop("height", Passthrough)
            .build(),
        EntryBuilder::new("RaisedButton", m)
            .stability(Stability::Deprecated, "2.0")
            .replaced_by("ElevatedButton")
            .required("onPressed", Callback)
            .prop("child", Passthrough)
            .prop("color", Color)
            .build(),
        EntryBuilder::new("FlatButton", m)
            .stability(Stability::Deprecated, "2.0")
            .replaced_by("TextButton")
            .required("onPressed", Callback)
            .prop("child", Passthrough)
            .build(),
        EntryBuilder::new("SearchAnchor", m)
            .stability(Stability::Beta, "3.10")
            .limitation("suggestion overlay does not follow scroll position")
            .required("builder", Callback)
            .required("suggestionsBuilder", Callback)
            .build(),
        EntryBuilder::new("CarouselView", m)
            .stability(Stability::Alpha, "3.24")
            .limitation("no snapping physics")
            .limitation("itemExtent is approximate")
            .required("itemExtent", Passthrough)
            .prop("children", Passthrough)
            .build(),
        EntryBuilder::new("WidgetInspector", w)
            .stability(Stability::Dev, "1.0")
            .prop("child", Passthrough)
            .prop("selectButtonBuilder", Callback)
            .build(),
    ]
}

lazy_static::lazy_static! {
    static ref BUILTIN_REGISTRY: WidgetRegistry = WidgetRegistry::from_entries(builtin_entries());

    /// Framework base classes recognised as superclasses, with the members
    /// subclasses inherit from them.
    pub static ref FRAMEWORK_BASES: HashMap<&'static str, &'static [&'static str]> = {
        let mut m: HashMap<&'static str, &'static [&'static str]> = HashMap::new();
        m.insert("StatefulWidget", &["key"]);
        m.insert("StatelessWidget", &["key"]);
        m.insert("State", &["widget", "context", "mounted", "setState"]);
        m.insert("ChangeNotifier", &["notifyListeners", "hasListeners"]);
        m.insert("Widget", &["key"]);
        m
    };

    /// Types the runtime ships besides widgets, keyed to their package.
    pub static ref RUNTIME_TYPES: HashMap<&'static str, &'static str> = {
        let mut m = HashMap::new();
        for name in [
            "StatefulWidget", "StatelessWidget", "State", "Widget", "BuildContext",
            "ChangeNotifier", "Key", "ValueKey", "GlobalKey",
        ] {
            m.insert(name, WIDGETS_MODULE);
        }
        for name in [
            "Colors", "Color", "EdgeInsets", "Alignment", "TextStyle", "FontWeight",
            "Duration", "Curves", "Icons", "ThemeData", "MainAxisAlignment",
            "CrossAxisAlignment", "MainAxisSize", "TextAlign", "TextOverflow",
            "BoxDecoration", "BorderRadius", "TextEditingController",
            "AnimationController", "ScrollController", "Navigator",
            "MaterialPageRoute", "SnackBar", "ScaffoldMessenger",
        ] {
            m.insert(name, MATERIAL_MODULE);
        }
        m
    };
}

pub const DEFAULT_BASE_CLASS: &str = "Widget";

pub fn is_framework_base(name: &str) -> bool {
    FRAMEWORK_BASES.contains_key(name)
}

pub fn inherited_members(base: &str) -> &'static [&'static str] {
    FRAMEWORK_BASES.get(base).copied().unwrap_or(&[])
}

/// Known widgets and their property schemas.
#[derive(Debug, Clone, Default)]
pub struct WidgetRegistry {
    entries: BTreeMap<String, WidgetEntry>,
}

impl WidgetRegistry {
    pub fn from_entries(entries: Vec<WidgetEntry>) -> Self {
        let mut map = BTreeMap::new();
        for entry in entries {
            map.insert(entry.name.clone(), entry);
        }
        WidgetRegistry { entries: map }
    }

    /// The process-wide registry built from the static table.
    pub fn builtin() -> &'static WidgetRegistry {
        &BUILTIN_REGISTRY
    }

    pub fn get(&self, name: &str) -> Option<&WidgetEntry> {
        self.entries.get(name)
    }

    /// Case-sensitive; widget names are capitalized.
    pub fn is_widget(&self, name: &str) -> bool {
        name.chars().next().map_or(false, |c| c.is_ascii_uppercase())
            && self.entries.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in name order.
    pub fn entries(&self) -> impl Iterator<Item = &WidgetEntry> {
        self.entries.values()
    }

    pub fn names(&self) -> HashSet<&str> {
        self.entries.keys().map(|k| k.as_str()).collect()
    }

    /// Runtime package for a widget or runtime type name.
    pub fn module_for(&self, name: &str) -> Option<&str> {
        self.entries
            .get(name)
            .map(|e| e.module.as_str())
            .or_else(|| RUNTIME_TYPES.get(name).copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_lookup() {
        let reg = WidgetRegistry::builtin();
        let text = reg.get("Text").expect("Text should be registered");
        assert_eq!(text.stability, Stability::Stable);
        assert_eq!(text.positional[0].name, "data");
        assert!(reg.is_widget("Container"));
        assert!(!reg.is_widget("container"));
        assert_eq!(reg.get("RaisedButton").map(|e| e.stability), Some(Stability::Deprecated));
    }

    #[test]
    fn test_deprecated_property_has_replacement() {
        let reg = WidgetRegistry::builtin();
        let scaffold = reg.get("Scaffold").expect("Scaffold");
        let prop = scaffold
            .property("resizeToAvoidBottomPadding")
            .expect("deprecated prop");
        assert!(prop.deprecated);
        assert_eq!(prop.replacement.as_deref(), Some("resizeToAvoidBottomInset"));
    }

    #[test]
    fn test_module_lookup_covers_runtime_types() {
        let reg = WidgetRegistry::builtin();
        assert_eq!(reg.module_for("Text"), Some(MATERIAL_MODULE));
        assert_eq!(reg.module_for("StatefulWidget"), Some(WIDGETS_MODULE));
        assert_eq!(reg.module_for("Colors"), Some(MATERIAL_MODULE));
        assert_eq!(reg.module_for("Nope"), None);
        assert_eq!(inherited_members("State"), &["widget", "context", "mounted", "setState"]);
    }
}
