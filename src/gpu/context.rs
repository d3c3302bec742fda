// Graphics context description
//
// `GlContext` is owned by the graphics manager and handed by reference to
// surfaces and pipelines. It is reset whenever the platform destroys the
// context and re-initialized from the device on recreation.

/// Graphics API profile of a context
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiProfile {
    /// Desktop profile with fixed function and optional shaders
    Desktop,
    /// Embedded subset, fixed function only
    Embedded,
    /// Embedded subset, programmable only
    Embedded2,
}

impl ApiProfile {
    pub fn is_embedded(self) -> bool {
        !matches!(self, ApiProfile::Desktop)
    }

    /// Whether the fixed-function pipeline exists on this profile
    pub fn has_fixed_function(self) -> bool {
        !matches!(self, ApiProfile::Embedded2)
    }
}

/// Capabilities reported by a device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    pub profile: ApiProfile,
    /// Largest texture edge in texels
    pub max_texture_size: u32,
    pub shaders_supported: bool,
    /// Non-power-of-two texture sizes
    pub npot_supported: bool,
    pub framebuffer_objects: bool,
}

impl Capabilities {
    /// A typical desktop context
    pub fn desktop() -> Self {
        Capabilities {
            profile: ApiProfile::Desktop,
            max_texture_size: 4096,
            shaders_supported: true,
            npot_supported: true,
            framebuffer_objects: true,
        }
    }

    /// A fixed-function embedded context
    pub fn embedded() -> Self {
        Capabilities {
            profile: ApiProfile::Embedded,
            max_texture_size: 2048,
            shaders_supported: false,
            npot_supported: false,
            framebuffer_objects: false,
        }
    }

    /// A programmable embedded context
    pub fn embedded2() -> Self {
        Capabilities {
            profile: ApiProfile::Embedded2,
            max_texture_size: 2048,
            shaders_supported: true,
            npot_supported: true,
            framebuffer_objects: true,
        }
    }
}

/// Capabilities of the live context, if any
#[derive(Debug, Clone, Default)]
pub struct GlContext {
    caps: Option<Capabilities>,
}

impl GlContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take over the capabilities of a freshly created context
    pub fn initialize(&mut self, caps: Capabilities) {
        log::debug!(
            "Context initialized: {:?}, max texture {}, shaders {}, npot {}",
            caps.profile,
            caps.max_texture_size,
            caps.shaders_supported,
            caps.npot_supported
        );
        self.caps = Some(caps);
    }

    /// Forget everything about the context
    pub fn reset(&mut self) {
        self.caps = None;
    }

    pub fn is_ready(&self) -> bool {
        self.caps.is_some()
    }

    pub fn capabilities(&self) -> Option<&Capabilities> {
        self.caps.as_ref()
    }

    /// API profile, desktop while no context exists
    pub fn profile(&self) -> ApiProfile {
        self.caps.map_or(ApiProfile::Desktop, |c| c.profile)
    }

    pub fn is_embedded(&self) -> bool {
        self.profile().is_embedded()
    }

    /// Largest texture edge, 0 while no context exists
    pub fn max_texture_size(&self) -> u32 {
        self.caps.map_or(0, |c| c.max_texture_size)
    }

    pub fn shaders_supported(&self) -> bool {
        self.caps.is_some_and(|c| c.shaders_supported)
    }

    pub fn npot_supported(&self) -> bool {
        self.caps.is_some_and(|c| c.npot_supported)
    }

    /// Whether palette expansion can run on the GPU
    pub fn palette_lookup_supported(&self) -> bool {
        self.caps.is_some_and(|c| {
            c.profile == ApiProfile::Desktop && c.shaders_supported && c.framebuffer_objects
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reset_context_reports_nothing() {
        let mut ctx = GlContext::new();
        ctx.initialize(Capabilities::desktop());
        assert!(ctx.is_ready());
        assert_eq!(ctx.max_texture_size(), 4096);

        ctx.reset();
        assert!(!ctx.is_ready());
        assert_eq!(ctx.max_texture_size(), 0);
        assert!(!ctx.shaders_supported());
        assert!(!ctx.palette_lookup_supported());
    }

    #[test]
    fn test_palette_lookup_requires_desktop_shaders() {
        let mut ctx = GlContext::new();
        ctx.initialize(Capabilities::desktop());
        assert!(ctx.palette_lookup_supported());

        ctx.initialize(Capabilities::embedded2());
        assert!(!ctx.palette_lookup_supported());

        let mut caps = Capabilities::desktop();
        caps.framebuffer_objects = false;
        ctx.initialize(caps);
        assert!(!ctx.palette_lookup_supported());
    }

    #[test]
    fn test_profile_fixed_function() {
        assert!(ApiProfile::Desktop.has_fixed_function());
        assert!(ApiProfile::Embedded.has_fixed_function());
        assert!(!ApiProfile::Embedded2.has_fixed_function());
        assert!(ApiProfile::Embedded.is_embedded());
        assert!(!ApiProfile::Desktop.is_embedded());
    }
}
