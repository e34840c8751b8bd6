use std::cell::RefCell;

use serde_json::{json, Value};

use nscni::commands::parse_cni_args;
use nscni::config::{NetConf, NetworkConfig};
use nscni::delegate::{delegate_add, delegate_del, DelegateOp, PluginInvoker};
use nscni::error::Error;
use nscni::plugin::NamespacePlugin;
use nscni::types::CmdArgs;

const CONFIG: &str = r#"
{
  "name": "namespace-network",
  "type": "nscni",
  "namespaces": {
    "isolated": {
      "name": "isolated",
      "type": "bridge",
      "mtu": 1460,
      "ipam": { "type": "host-local", "subnet": "10.2.0.0/16" }
    }
  },
  "default": {
    "name": "default-bridge",
    "type": "bridge",
    "bridge": "mybridge"
  }
}
"#;

/// In-process stand-in for the exec boundary: records every invocation and
/// replays a canned response.
struct RecordingInvoker {
    calls: RefCell<Vec<(String, DelegateOp, Vec<u8>)>>,
    fail_with: Option<String>,
    result: Vec<u8>,
}

impl RecordingInvoker {
    fn returning(result: &[u8]) -> Self {
        Self {
            calls: RefCell::new(Vec::new()),
            fail_with: None,
            result: result.to_vec(),
        }
    }

    fn failing(message: &str) -> Self {
        Self {
            calls: RefCell::new(Vec::new()),
            fail_with: Some(message.to_string()),
            result: Vec::new(),
        }
    }

    fn calls(&self) -> Vec<(String, DelegateOp, Vec<u8>)> {
        self.calls.borrow().clone()
    }
}

impl PluginInvoker for RecordingInvoker {
    fn invoke(&self, plugin_type: &str, op: DelegateOp, netconf: &[u8]) -> nscni::Result<Vec<u8>> {
        self.calls
            .borrow_mut()
            .push((plugin_type.to_string(), op, netconf.to_vec()));

        match &self.fail_with {
            Some(message) => Err(Error::Delegation {
                plugin_type: plugin_type.to_string(),
                message: message.clone(),
            }),
            None => Ok(self.result.clone()),
        }
    }
}

fn netconf(value: Value) -> NetworkConfig {
    serde_json::from_value(value).unwrap()
}

fn cmd_args(cni_args: &str) -> CmdArgs {
    CmdArgs {
        container_id: "test-container".to_string(),
        netns: "/var/run/netns/test".to_string(),
        ifname: "eth0".to_string(),
        args: parse_cni_args(cni_args),
        path: "/opt/cni/bin".to_string(),
        stdin_data: CONFIG.as_bytes().to_vec(),
    }
}

// The delegate receives semantically identical data to what was resolved.
#[test]
fn test_delegate_add_forwards_config_unchanged() -> Result<(), Box<dyn std::error::Error>> {
    let original = json!({
        "name": "isolated",
        "type": "bridge",
        "mtu": 1460,
        "isGateway": true,
        "ipam": { "type": "host-local", "subnet": "10.2.0.0/16" }
    });
    let conf = netconf(original.clone());

    let invoker = RecordingInvoker::returning(b"{}");
    delegate_add(&invoker, &conf)?;

    let calls = invoker.calls();
    assert_eq!(calls.len(), 1);

    let (plugin_type, op, payload) = &calls[0];
    assert_eq!(plugin_type, "bridge");
    assert_eq!(*op, DelegateOp::Add);

    let received: Value = serde_json::from_slice(payload)?;
    assert_eq!(received, original);

    Ok(())
}

#[test]
fn test_delegate_add_returns_result_verbatim() -> Result<(), Box<dyn std::error::Error>> {
    let result = br#"{"cniVersion":"0.2.0","ip4":{"ip":"10.2.0.5/16"}}"#;
    let invoker = RecordingInvoker::returning(result);

    let out = delegate_add(&invoker, &netconf(json!({ "type": "bridge" })))?;

    assert_eq!(out, result.to_vec());

    Ok(())
}

#[test]
fn test_delegate_del_has_no_payload() -> Result<(), Box<dyn std::error::Error>> {
    let invoker = RecordingInvoker::returning(b"");

    delegate_del(&invoker, &netconf(json!({ "type": "bridge" })))?;

    let calls = invoker.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].1, DelegateOp::Del);

    Ok(())
}

// A config without a usable "type" never reaches the delegate.
#[test]
fn test_missing_plugin_type_fails_before_invoke() {
    let invoker = RecordingInvoker::returning(b"{}");

    let err = delegate_add(&invoker, &netconf(json!({ "name": "no-type" }))).unwrap_err();
    assert!(matches!(err, Error::MissingPluginType));

    let err = delegate_del(&invoker, &netconf(json!({ "type": 42 }))).unwrap_err();
    assert!(matches!(err, Error::MissingPluginType));

    assert!(invoker.calls().is_empty());
}

// The delegate's own failure message is surfaced, not swallowed.
#[test]
fn test_delegate_failure_preserves_message() {
    let invoker = RecordingInvoker::failing("bridge: no such device \"mybridge\"");

    let err = delegate_add(&invoker, &netconf(json!({ "type": "bridge" }))).unwrap_err();

    assert!(err.to_string().contains("no such device \"mybridge\""));
}

#[test]
fn test_plugin_add_network_resolves_and_delegates() -> Result<(), Box<dyn std::error::Error>> {
    let conf = NetConf::parse(CONFIG.as_bytes())?;
    let invoker = RecordingInvoker::returning(br#"{"cniVersion":"0.2.0"}"#);

    let plugin = NamespacePlugin::with_invoker(
        conf,
        cmd_args("K8S_POD_NAMESPACE=isolated;K8S_POD_NAME=web-1"),
        &invoker,
    );

    let result = plugin.add_network()?;
    assert_eq!(result, br#"{"cniVersion":"0.2.0"}"#.to_vec());

    let calls = invoker.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0, "bridge");

    Ok(())
}

#[test]
fn test_plugin_del_network_uses_same_resolution() -> Result<(), Box<dyn std::error::Error>> {
    let conf = NetConf::parse(CONFIG.as_bytes())?;
    let invoker = RecordingInvoker::returning(b"");

    let plugin = NamespacePlugin::with_invoker(
        conf,
        cmd_args("K8S_POD_NAMESPACE=other;K8S_POD_NAME=web-1"),
        &invoker,
    );

    plugin.del_network()?;

    // "other" has no entry, so the default is what gets torn down.
    let calls = invoker.calls();
    assert_eq!(calls.len(), 1);
    let received: Value = serde_json::from_slice(&calls[0].2)?;
    assert_eq!(
        received.get("name").and_then(|v| v.as_str()),
        Some("default-bridge")
    );

    Ok(())
}

// Resolution failures short-circuit: nothing is delegated.
#[test]
fn test_plugin_add_without_namespace_never_delegates() -> Result<(), Box<dyn std::error::Error>> {
    let conf = NetConf::parse(CONFIG.as_bytes())?;
    let invoker = RecordingInvoker::returning(b"{}");

    let plugin = NamespacePlugin::with_invoker(conf, cmd_args(""), &invoker);

    let err = plugin.add_network().unwrap_err();
    assert!(matches!(err, Error::MissingNamespace));
    assert!(invoker.calls().is_empty());

    Ok(())
}
