//! Graphics identity adapter
//!
//! Vendor, renderer and version strings come from `glGetString` on the
//! rendering context current on the calling thread. The windowing binding
//! that owns the context hands us its `glGetString` entry point; without
//! one, or when the call returns null, there is no current context and all
//! three fields are unavailable.

use std::ffi::{c_char, c_void, CStr};

use serde::Serialize;
use tracing::debug;

use super::{Field, GraphicsSource};
use crate::error::FieldUnavailable;

pub const GL_VENDOR: u32 = 0x1F00;
pub const GL_RENDERER: u32 = 0x1F01;
pub const GL_VERSION: u32 = 0x1F02;

/// Signature of `glGetString`
pub type GlGetStringFn = unsafe extern "system" fn(name: u32) -> *const u8;

/// Vendor, renderer and driver strings of the active rendering context
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GraphicsIdentity {
    pub vendor: Field<String>,
    pub renderer: Field<String>,
    pub driver_version: Field<String>,
}

impl GraphicsIdentity {
    /// All three fields unavailable for the same reason
    pub fn unavailable(reason: FieldUnavailable) -> Self {
        Self {
            vendor: Field::Unavailable(reason.clone()),
            renderer: Field::Unavailable(reason.clone()),
            driver_version: Field::Unavailable(reason),
        }
    }
}

/// Handle on a GL binding's `glGetString`
#[derive(Debug, Clone, Copy, Default)]
pub struct GlContext {
    get_string: Option<GlGetStringFn>,
}

impl GlContext {
    /// No graphics binding: every query reports no current context
    pub fn none() -> Self {
        Self { get_string: None }
    }

    /// Wrap a `glGetString` entry point.
    ///
    /// # Safety
    ///
    /// `get_string` must behave like `glGetString`: for the enums above it
    /// returns null or a pointer to a NUL-terminated string that stays valid
    /// for the duration of the query.
    pub unsafe fn from_get_string(get_string: GlGetStringFn) -> Self {
        Self {
            get_string: Some(get_string),
        }
    }

    /// Resolve `glGetString` through a binding's proc-address loader
    /// (`wglGetProcAddress`, `glXGetProcAddress`, `SDL_GL_GetProcAddress`,
    /// ...). A null address yields [`GlContext::none`].
    ///
    /// # Safety
    ///
    /// A non-null address returned by `loader` must be a `glGetString`
    /// implementation, with the contract described on
    /// [`GlContext::from_get_string`].
    pub unsafe fn from_loader<F>(mut loader: F) -> Self
    where
        F: FnMut(&str) -> *const c_void,
    {
        let address = loader("glGetString");
        if address.is_null() {
            return Self::none();
        }

        let get_string = std::mem::transmute::<*const c_void, GlGetStringFn>(address);
        Self::from_get_string(get_string)
    }

    fn query(&self, get_string: GlGetStringFn, name: u32) -> Field<String> {
        // SAFETY: upheld by the constructor contract.
        let ptr = unsafe { get_string(name) };
        unsafe { gl_string_field(ptr) }
    }
}

impl GraphicsSource for GlContext {
    fn graphics(&self) -> GraphicsIdentity {
        let Some(get_string) = self.get_string else {
            debug!("no GL binding, graphics fields unavailable");
            return GraphicsIdentity::unavailable(FieldUnavailable::NoRenderContext);
        };

        // glGetString returns null when no context is current
        // SAFETY: upheld by the constructor contract.
        let vendor_ptr = unsafe { get_string(GL_VENDOR) };
        if vendor_ptr.is_null() {
            debug!("glGetString returned null, no current context");
            return GraphicsIdentity::unavailable(FieldUnavailable::NoRenderContext);
        }

        let identity = GraphicsIdentity {
            vendor: unsafe { gl_string_field(vendor_ptr) },
            renderer: self.query(get_string, GL_RENDERER),
            driver_version: self.query(get_string, GL_VERSION),
        };
        debug!(
            vendor = ?identity.vendor,
            renderer = ?identity.renderer,
            driver = ?identity.driver_version,
            "graphics identity queried"
        );
        identity
    }
}

/// # Safety
///
/// `ptr` is null or points to a NUL-terminated string.
unsafe fn gl_string_field(ptr: *const u8) -> Field<String> {
    if ptr.is_null() {
        return Field::Unavailable(FieldUnavailable::query(
            "glGetString",
            "returned null",
        ));
    }

    match CStr::from_ptr(ptr as *const c_char).to_str() {
        Ok(text) => Field::from_text("glGetString", text),
        Err(_) => Field::Unavailable(FieldUnavailable::InvalidText {
            source_name: "glGetString",
        }),
    }
}
