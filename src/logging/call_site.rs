//! Call-site capture
//!
//! Locations come from `#[track_caller]`: every public logging entry point is
//! annotated, so [`Location::caller`] resolves to the first frame outside this
//! crate. Callers that want the module path and function name can build a
//! [`CallSite`] with the [`callsite!`](crate::callsite) macro instead.

use std::panic::Location;
use std::sync::atomic::{AtomicBool, Ordering};

/// Source location of a log call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallSite {
    /// Module path, or the source file when only the file is known
    pub module: String,
    pub function: Option<String>,
    pub line: u32,
}

impl CallSite {
    pub fn new(module: impl Into<String>, function: Option<&str>, line: u32) -> Self {
        Self {
            module: module.into(),
            function: function.map(str::to_string),
            line,
        }
    }

    pub fn from_location(location: &Location<'_>) -> Self {
        Self {
            module: location.file().to_string(),
            function: None,
            line: location.line(),
        }
    }

    /// Token parts in render order
    pub fn parts(&self) -> Vec<String> {
        let mut parts = vec![self.module.clone()];
        if let Some(function) = &self.function {
            parts.push(function.clone());
        }
        parts.push(self.line.to_string());
        parts
    }
}

/// Location reported by an embedded web page's console
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebSource {
    pub source_id: String,
    pub line: u32,
}

impl WebSource {
    pub fn new(source_id: impl Into<String>, line: u32) -> Self {
        Self {
            source_id: source_id.into(),
            line,
        }
    }

    pub fn parts(&self) -> Vec<String> {
        vec![self.source_id.clone(), self.line.to_string()]
    }
}

/// Render location parts as one bracketed token: `[a, b, c]`
///
/// Line breaks inside a part are flattened to spaces so the token never
/// splits a log line.
pub fn render_token(parts: &[String]) -> String {
    let parts: Vec<String> = parts
        .iter()
        .map(|part| part.replace(['\r', '\n'], " "))
        .collect();
    format!("[{}]", parts.join(", "))
}

/// Decides whether call sites are captured
#[derive(Debug, Default)]
pub struct CallSiteResolver {
    capture: AtomicBool,
}

impl CallSiteResolver {
    pub fn new(capture: bool) -> Self {
        Self {
            capture: AtomicBool::new(capture),
        }
    }

    pub fn set_capture(&self, capture: bool) {
        self.capture.store(capture, Ordering::Relaxed);
    }

    pub fn is_capturing(&self) -> bool {
        self.capture.load(Ordering::Relaxed)
    }

    /// Location of the first caller outside the logging facility
    ///
    /// Always `None` while capture is off.
    #[track_caller]
    pub fn resolve(&self) -> Option<CallSite> {
        if !self.is_capturing() {
            return None;
        }
        Some(CallSite::from_location(Location::caller()))
    }

    /// Pass an explicit location through the capture switch
    pub fn accept(&self, site: CallSite) -> Option<CallSite> {
        self.is_capturing().then_some(site)
    }
}

/// Build a [`CallSite`] for the current module, function and line
#[macro_export]
macro_rules! callsite {
    () => {{
        fn __here() {}
        fn __type_name_of<T>(_: T) -> &'static str {
            ::std::any::type_name::<T>()
        }
        let name = __type_name_of(__here);
        let name = name.strip_suffix("::__here").unwrap_or(name);
        let function = name.rsplit("::").next().unwrap_or(name);
        $crate::logging::CallSite::new(module_path!(), Some(function), line!())
    }};
}
