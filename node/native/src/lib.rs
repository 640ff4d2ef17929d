//! Node.js bindings for the Ruby parser bridge
//!
//! Boots the embedded Ruby VM when the addon is loaded and exports `setup` and
//! `parse`. All calls delegate to `rubyparse_core::adapter::Bridge`; the VM is
//! shut down from an environment cleanup hook when Node tears the env down.

use std::cell::RefCell;
use std::rc::Rc;

use napi::bindgen_prelude::*;
use napi::{CallContext, JsObject, JsUnknown, ValueType};
use napi_derive::napi;
use tracing_subscriber::EnvFilter;

use rubyparse_core::config::LOG_ENV;
use rubyparse_core::ruby::RubyRuntime;
use rubyparse_core::{Bridge, BridgeConfig, BridgeError, HostArg};

type SharedBridge = Rc<RefCell<Bridge<RubyRuntime>>>;

/// Addon entry point, run once per Node environment that loads the addon
///
/// Only the first environment in the process gets the Ruby VM. Any later one
/// (a worker thread, say) fails to load with a JS `Error`, and registers no
/// cleanup hook, so it can never shut the shared VM down.
#[napi(module_exports)]
pub fn init(mut exports: JsObject, mut env: Env) -> Result<()> {
    let config = BridgeConfig::load().map_err(|e| Error::from_reason(format!("{:#}", e)))?;
    init_tracing(&config);

    let bridge = Bridge::boot(RubyRuntime::new(), config)
        .map_err(|e| Error::from_reason(e.to_string()))?;
    let bridge: SharedBridge = Rc::new(RefCell::new(bridge));

    let setup_bridge = bridge.clone();
    let setup = env.create_function_from_closure("setup", move |ctx: CallContext| {
        let args = host_args(&ctx)?;
        let result = setup_bridge.borrow_mut().setup(&args);
        match result {
            Ok(()) => ctx.env.get_undefined().map(|u| u.into_unknown()),
            Err(err) => throw(ctx.env, err),
        }
    })?;
    exports.set_named_property("setup", setup)?;

    let parse_bridge = bridge.clone();
    let parse = env.create_function_from_closure("parse", move |ctx: CallContext| {
        let args = host_args(&ctx)?;
        let result = parse_bridge.borrow_mut().parse(&args);
        match result {
            Ok(value) => ctx.env.to_js_value(&value),
            Err(err) => throw(ctx.env, err),
        }
    })?;
    exports.set_named_property("parse", parse)?;

    env.add_env_cleanup_hook(bridge, |bridge| bridge.borrow_mut().teardown())?;

    Ok(())
}

/// Install a stderr subscriber unless the process already has one
fn init_tracing(config: &BridgeConfig) {
    let filter =
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(&config.log_filter));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Collect the raw call arguments, keeping non-strings as their JS type name
fn host_args(ctx: &CallContext) -> Result<Vec<HostArg>> {
    (0..ctx.length)
        .map(|idx| {
            let value = ctx.get::<JsUnknown>(idx)?;
            match value.get_type()? {
                ValueType::String => Ok(HostArg::Str(
                    value.coerce_to_string()?.into_utf8()?.into_owned()?,
                )),
                other => Ok(HostArg::Other(format!("{:?}", other))),
            }
        })
        .collect()
}

/// Raise a bridge error in JS: contract violations as `TypeError`, the rest as `Error`
fn throw(env: &Env, err: BridgeError) -> Result<JsUnknown> {
    let message = err.to_string();
    if err.is_type_error() {
        env.throw_type_error(&message, None)?;
    } else {
        env.throw_error(&message, None)?;
    }
    env.get_undefined().map(|u| u.into_unknown())
}
