use proptest::prelude::*;

use kubectl_credentials_helper::kubeconfig::{
    codec, AuthInfo, Cluster, Context, ExecConfig, KubeConfig, NamedAuthInfo, NamedCluster,
    NamedContext,
};

fn name() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9-]{0,12}"
}

fn data() -> impl Strategy<Value = Option<String>> {
    proptest::option::of("[A-Za-z0-9+/]{4,40}={0,2}")
}

fn auth_info() -> impl Strategy<Value = AuthInfo> {
    (data(), data(), proptest::option::of(name()), proptest::option::of("[ -~]{0,20}"), any::<bool>())
        .prop_map(|(cert, key, username, password, delegated)| AuthInfo {
            client_certificate_data: cert,
            client_key_data: key,
            username,
            password,
            exec: delegated.then(|| ExecConfig::delegate_to("/usr/local/bin/helper")),
            ..Default::default()
        })
}

fn kubeconfig() -> impl Strategy<Value = KubeConfig> {
    (
        proptest::collection::vec((name(), "https://[a-z]{1,10}\\.example(:[0-9]{4})?"), 0..4),
        proptest::collection::vec((name(), name(), name()), 0..4),
        proptest::collection::vec((name(), auth_info()), 0..4),
    )
        .prop_map(|(clusters, contexts, users)| KubeConfig {
            api_version: Some("v1".into()),
            kind: Some("Config".into()),
            clusters: clusters
                .into_iter()
                .map(|(name, server)| NamedCluster {
                    name,
                    cluster: Cluster { server, ..Default::default() },
                })
                .collect(),
            contexts: contexts
                .into_iter()
                .map(|(name, cluster, user)| NamedContext {
                    name,
                    context: Context { cluster, user, ..Default::default() },
                })
                .collect(),
            users: users
                .into_iter()
                .map(|(name, user)| NamedAuthInfo { name, user })
                .collect(),
            ..Default::default()
        })
}

proptest! {
    #[test]
    fn decode_inverts_encode(config in kubeconfig()) {
        let bytes = codec::encode(&config).unwrap();
        prop_assert_eq!(codec::decode(&bytes).unwrap(), config.clone());

        let text = codec::encode_base64(&config).unwrap();
        prop_assert_eq!(codec::decode_base64(&text).unwrap(), config);
    }
}
