//! Usage and guidance text printed by the command dispatcher

/// Full usage text
pub fn usage() -> String {
    format!(
        "\
{name} - control cluster bootstrapping and destroying

Usage:
  {name} <command>

Commands:
  create - bootstraps cluster
  delete - destroys cluster
  help   - prints this message

Environment:
  KIND_CLUSTER_MANIFEST             - path to cluster manifest file (required for create)
  KIND_KUBECONFIG                   - path to kubeconfig to OVERRIDE cluster access data
                                      (default: /root/.kube/config)
  KIND_INITIAL_KUBERNETES_MANIFESTS - path to kubernetes manifests for initial
                                      installation (default: /manifests/init.yml)
  KIND_DNS_SERVER_IP                - ip address of DNS server (default: 10.254.254.254)
  KIND_CONTROL_PLANE_NODE           - control-plane container (default: kind-control-plane)
  KIND_SETTLE_DELAY_SECS            - wait after cluster creation (default: 5)
  KIND_READINESS_ADDR               - host:port to probe instead of waiting a fixed delay
  KIND_READINESS_TIMEOUT_SECS       - readiness probe deadline (default: 120)
  KIND_BIN, YQ_BIN, DOCKER_BIN, KUBECTL_BIN
                                    - external tool locations
  KIND_BOOTSTRAP_CONFIG             - optional YAML file with the same settings
  RUST_LOG                          - log filter (default: info)
",
        name = env!("CARGO_PKG_NAME")
    )
}

/// Printed before the usage text when no cluster manifest is configured
pub fn missing_manifest_guidance() -> &'static str {
    "You must define KIND_CLUSTER_MANIFEST env to path of cluster manifest.\n\
     See details here: https://kind.sigs.k8s.io/docs/user/configuration/\n"
}
