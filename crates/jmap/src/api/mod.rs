/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

pub mod acl;
pub mod auth;
pub mod request;
pub mod session;

use crate::api::request::RequestContext;
use ahash::AHashMap;
use jmap_proto::{
    error::method::MethodError,
    request::capability::{
        Capabilities, Capability, CoreCapabilities, EmptyCapabilities, WebSocketCapabilities,
    },
};
use std::sync::Arc;
use utils::map::vec_map::VecMap;

/// Handlers that do not mutate account-scoped state; the dispatcher
/// opens shared (read-only) conversational state for them.
pub const SHARED_CSTATE: u32 = 1 << 0;

pub type MethodHandler =
    Box<dyn Fn(&mut RequestContext<'_>) -> Result<(), MethodError> + Send + Sync>;

/// Registry entry: a method name bound to its handler, flags and the
/// capability that advertises it.
pub struct JmapMethod {
    pub name: &'static str,
    pub capability: Capability,
    pub flags: u32,
    pub handler: MethodHandler,
}

/// Raw configured limits. Values are validated by
/// `JmapSettings::parse`; sizes are in bytes.
#[derive(Debug, Clone)]
pub struct JmapConfig {
    pub max_size_upload: i64,
    pub max_concurrent_upload: i64,
    pub max_size_request: i64,
    pub max_concurrent_requests: i64,
    pub max_calls_in_request: i64,
    pub max_objects_in_get: i64,
    pub max_objects_in_set: i64,
    pub base_url: String,
    pub ws_enabled: bool,
}

impl Default for JmapConfig {
    fn default() -> Self {
        JmapConfig {
            max_size_upload: 50_000_000,
            max_concurrent_upload: 4,
            max_size_request: 10_000_000,
            max_concurrent_requests: 4,
            max_calls_in_request: 16,
            max_objects_in_get: 500,
            max_objects_in_set: 500,
            base_url: "https://localhost".to_string(),
            ws_enabled: false,
        }
    }
}

/// Frozen after server init: the method registry, the advertised
/// capability set and the enforced limits.
pub struct JmapSettings {
    methods: AHashMap<&'static str, JmapMethod>,
    can_use: u32,
    pub core: CoreCapabilities,
    pub base_url: String,
    pub ws_enabled: bool,
}

impl JmapSettings {
    pub fn parse(config: JmapConfig) -> Self {
        JmapSettings {
            methods: AHashMap::with_capacity(128),
            can_use: 0,
            core: CoreCapabilities {
                max_size_upload: read_opt("max_size_upload", config.max_size_upload),
                max_concurrent_upload: read_opt(
                    "max_concurrent_upload",
                    config.max_concurrent_upload,
                ),
                max_size_request: read_opt("max_size_request", config.max_size_request),
                max_concurrent_requests: read_opt(
                    "max_concurrent_requests",
                    config.max_concurrent_requests,
                ),
                max_calls_in_request: read_opt(
                    "max_calls_in_request",
                    config.max_calls_in_request,
                ),
                max_objects_in_get: read_opt("max_objects_in_get", config.max_objects_in_get),
                max_objects_in_set: read_opt("max_objects_in_set", config.max_objects_in_set),
                collation_algorithms: CoreCapabilities::default().collation_algorithms,
            },
            base_url: config.base_url,
            ws_enabled: config.ws_enabled,
        }
    }

    /// Adds a capability to the set clients may request in `using`.
    pub fn advertise(&mut self, capability: Capability) {
        self.can_use |= capability as u32;
    }

    pub fn can_use(&self) -> u32 {
        self.can_use
    }

    pub fn register(&mut self, method: JmapMethod) {
        debug_assert!(
            !self.methods.contains_key(method.name),
            "method {} registered twice",
            method.name
        );
        self.methods.insert(method.name, method);
    }

    pub fn method(&self, name: &str) -> Option<&JmapMethod> {
        self.methods.get(name)
    }

    /// Capability objects for the Session resource, in advertisement
    /// order.
    pub fn capabilities_object(&self) -> VecMap<Capability, Capabilities> {
        let mut capabilities = VecMap::new();
        for capability in Capability::all_capabilities() {
            if self.can_use & *capability as u32 != 0 {
                let object = match capability {
                    Capability::Core => Capabilities::Core(self.core.clone()),
                    Capability::WebSocket => {
                        Capabilities::WebSocket(WebSocketCapabilities::new(&self.base_url))
                    }
                    _ => Capabilities::Empty(EmptyCapabilities::default()),
                };
                capabilities.append(*capability, object);
            }
        }
        capabilities
    }
}

/// Any limit configured to zero or below disables the guarded call.
fn read_opt(name: &str, value: i64) -> usize {
    if value <= 0 {
        tracing::error!(option = name, value, "invalid limit value, treating as 0");
        0
    } else {
        value as usize
    }
}

pub struct Server {
    pub settings: JmapSettings,
    pub store: Arc<dyn store::Store>,
}

impl Server {
    pub fn new(mut settings: JmapSettings, store: Arc<dyn store::Store>) -> Self {
        register_core(&mut settings);
        Server { settings, store }
    }
}

/// Methods implemented by the core itself.
fn register_core(settings: &mut JmapSettings) {
    settings.advertise(Capability::Core);
    settings.register(JmapMethod {
        name: "Core/echo",
        capability: Capability::Core,
        flags: SHARED_CSTATE,
        handler: Box::new(core_echo),
    });
    settings.register(JmapMethod {
        name: "Blob/get",
        capability: Capability::Core,
        flags: SHARED_CSTATE,
        handler: Box::new(crate::blob::get::blob_get),
    });
    settings.register(JmapMethod {
        name: "Blob/copy",
        capability: Capability::Core,
        flags: 0,
        handler: Box::new(crate::blob::copy::blob_copy),
    });
}

fn core_echo(ctx: &mut RequestContext<'_>) -> Result<(), MethodError> {
    let arguments = ctx.arguments.clone();
    ctx.ok(arguments);
    Ok(())
}
