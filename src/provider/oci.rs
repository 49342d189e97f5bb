use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Request, RequestBuilder, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use tokio::sync::OnceCell;

use super::signer::RequestSigner;
use super::types::{ProvisionRequest, ProvisionedInstance};
use super::wire::{
    AvailabilityDomain, ErrorBody, Instance, LaunchInstanceDetails, Subnet, Vcn, Vnic,
    VnicAttachment,
};
use super::ProvisioningApi;
use crate::config::{ConfigError, HunterConfig};
use crate::error::HunterError;

const API_VERSION: &str = "20160918";

/// Connection settings for [`OciClient`].
#[derive(Debug)]
pub struct OciSettings {
    pub compute_endpoint: String,
    pub identity_endpoint: String,
    pub compartment_id: String,
    /// API-key signer; takes precedence over `auth_token`.
    pub signer: Option<RequestSigner>,
    /// Bearer token for a signing proxy in front of the API.
    pub auth_token: Option<SecretString>,
    pub timeout_seconds: u64,
}

impl OciSettings {
    pub fn from_config(config: &HunterConfig) -> Result<Self, ConfigError> {
        let provider = &config.provider;
        let compartment_id = provider
            .compartment()
            .ok_or_else(|| ConfigError::Missing(vec!["provider.compartment_id".to_string()]))?
            .to_string();
        let signer = match (
            &provider.tenancy_id,
            &provider.user_id,
            &provider.fingerprint,
            &provider.private_key_path,
        ) {
            (Some(tenancy), Some(user), Some(fingerprint), Some(key_path)) => {
                let key_file = expand_home(key_path);
                Some(RequestSigner::from_key_file(tenancy, user, fingerprint, &key_file)?)
            }
            _ if provider.auth_token.is_some() => None,
            _ => return Err(ConfigError::Missing(provider.missing_credentials())),
        };
        Ok(Self {
            compute_endpoint: provider.compute_endpoint_for(&config.region),
            identity_endpoint: provider.identity_endpoint_for(&config.region),
            compartment_id,
            signer,
            auth_token: provider
                .auth_token
                .as_ref()
                .map(|token| SecretString::new(token.expose_secret().clone())),
            timeout_seconds: provider.timeout_secs,
        })
    }
}

fn expand_home(path: &str) -> PathBuf {
    match (path.strip_prefix("~/"), dirs::home_dir()) {
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(path),
    }
}

/// REST client for OCI Compute, Virtual Network and Identity.
///
/// Availability domains and the chosen subnet are looked up once and cached.
pub struct OciClient {
    client: Client,
    settings: OciSettings,
    availability_domains: OnceCell<Vec<String>>,
    default_subnet: OnceCell<String>,
}

impl OciClient {
    pub fn new(settings: OciSettings) -> Result<Self, HunterError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_seconds))
            .build()?;
        Ok(Self::with_client(client, settings))
    }

    /// Creates a client around an existing HTTP client.
    pub fn with_client(client: Client, settings: OciSettings) -> Self {
        log::info!(
            "OCI client initialized for endpoint {}",
            settings.compute_endpoint
        );
        Self {
            client,
            settings,
            availability_domains: OnceCell::new(),
            default_subnet: OnceCell::new(),
        }
    }

    pub fn compartment_id(&self) -> &str {
        &self.settings.compartment_id
    }

    fn compute_url(&self, path: &str) -> String {
        format!(
            "{}/{API_VERSION}/{path}",
            self.settings.compute_endpoint.trim_end_matches('/')
        )
    }

    fn identity_url(&self, path: &str) -> String {
        format!(
            "{}/{API_VERSION}/{path}",
            self.settings.identity_endpoint.trim_end_matches('/')
        )
    }

    /// Builds the request and authenticates it: API-key signature, else bearer token.
    fn authorize(&self, req: RequestBuilder) -> Result<Request, HunterError> {
        let req = match (&self.settings.signer, &self.settings.auth_token) {
            (None, Some(token)) => req.bearer_auth(token.expose_secret()),
            _ => req,
        };
        let mut request = req.build()?;
        if let Some(signer) = &self.settings.signer {
            signer.sign(&mut request)?;
        }
        Ok(request)
    }

    async fn send_json<T: DeserializeOwned>(&self, req: RequestBuilder) -> Result<T, HunterError> {
        let resp = self.client.execute(self.authorize(req)?).await?;
        let status = resp.status();
        let body = resp.text().await?;
        if !status.is_success() {
            return Err(service_error(status, &body));
        }
        Ok(serde_json::from_str(&body)?)
    }

    async fn send_empty(&self, req: RequestBuilder) -> Result<(), HunterError> {
        let resp = self.client.execute(self.authorize(req)?).await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(service_error(status, &body));
        }
        Ok(())
    }

    async fn fetch_instance(&self, instance_id: &str) -> Result<Instance, HunterError> {
        self.send_json(
            self.client
                .get(self.compute_url(&format!("instances/{instance_id}"))),
        )
        .await
    }

    async fn primary_vnic(&self, instance_id: &str) -> Result<Option<Vnic>, HunterError> {
        let attachments: Vec<VnicAttachment> = self
            .send_json(self.client.get(self.compute_url("vnicAttachments")).query(&[
                ("compartmentId", self.compartment_id()),
                ("instanceId", instance_id),
            ]))
            .await?;
        let Some(vnic_id) = attachments.into_iter().find_map(|a| a.vnic_id) else {
            return Ok(None);
        };
        let vnic = self
            .send_json(self.client.get(self.compute_url(&format!("vnics/{vnic_id}"))))
            .await?;
        Ok(Some(vnic))
    }

    async fn lookup_subnet(&self) -> Result<Option<String>, HunterError> {
        let vcns: Vec<Vcn> = self
            .send_json(
                self.client
                    .get(self.compute_url("vcns"))
                    .query(&[("compartmentId", self.compartment_id())]),
            )
            .await?;
        let Some(vcn) = vcns.first() else {
            log::warn!("no VCNs found in compartment");
            return Ok(None);
        };
        log::info!("using VCN {}", vcn.display_name);

        let subnets: Vec<Subnet> = self
            .send_json(self.client.get(self.compute_url("subnets")).query(&[
                ("compartmentId", self.compartment_id()),
                ("vcnId", vcn.id.as_str()),
            ]))
            .await?;
        let chosen = subnets
            .iter()
            .find(|s| !s.prohibit_public_ip_on_vnic)
            .or_else(|| subnets.first());
        match chosen {
            Some(subnet) => {
                log::info!("using subnet {}", subnet.display_name);
                Ok(Some(subnet.id.clone()))
            }
            None => {
                log::warn!("no subnets found in VCN {}", vcn.display_name);
                Ok(None)
            }
        }
    }
}

fn service_error(status: StatusCode, body: &str) -> HunterError {
    let (code, message) = match serde_json::from_str::<ErrorBody>(body) {
        Ok(err) => (err.code, err.message),
        Err(_) => (String::new(), body.trim().to_string()),
    };
    if status == StatusCode::TOO_MANY_REQUESTS {
        return HunterError::RateLimited(message);
    }
    HunterError::Service {
        status: status.as_u16(),
        code,
        message,
    }
}

#[async_trait]
impl ProvisioningApi for OciClient {
    async fn create_instance(
        &self,
        request: &ProvisionRequest,
    ) -> Result<ProvisionedInstance, HunterError> {
        log::info!("creating instance {}", request.display_name);
        let body = LaunchInstanceDetails::from(request);
        let instance: Instance = self
            .send_json(self.client.post(self.compute_url("instances")).json(&body))
            .await?;
        log::info!("instance creation initiated: {}", instance.id);
        Ok(instance.into_provisioned(None, None))
    }

    async fn get_instance_details(
        &self,
        instance_id: &str,
    ) -> Result<ProvisionedInstance, HunterError> {
        let instance = self.fetch_instance(instance_id).await?;
        let vnic = self.primary_vnic(instance_id).await?;
        let (public_ip, private_ip) = match vnic {
            Some(vnic) => (vnic.public_ip, vnic.private_ip),
            None => (None, None),
        };
        Ok(instance.into_provisioned(public_ip, private_ip))
    }

    async fn is_running(&self, instance_id: &str) -> bool {
        match self.fetch_instance(instance_id).await {
            Ok(instance) => instance.lifecycle_state.is_running(),
            Err(err) => {
                log::warn!("error checking state of {instance_id}: {err}");
                false
            }
        }
    }

    async fn terminate_instance(&self, instance_id: &str) -> bool {
        let req = self
            .client
            .delete(self.compute_url(&format!("instances/{instance_id}")));
        match self.send_empty(req).await {
            Ok(()) => {
                log::info!("instance termination initiated: {instance_id}");
                true
            }
            Err(err) => {
                log::error!("error terminating instance {instance_id}: {err}");
                false
            }
        }
    }

    async fn availability_domains(&self) -> Result<Vec<String>, HunterError> {
        let domains = self
            .availability_domains
            .get_or_try_init(|| async {
                let ads: Vec<AvailabilityDomain> = self
                    .send_json(
                        self.client
                            .get(self.identity_url("availabilityDomains"))
                            .query(&[("compartmentId", self.compartment_id())]),
                    )
                    .await?;
                log::info!("found {} availability domains", ads.len());
                Ok::<_, HunterError>(ads.into_iter().map(|ad| ad.name).collect())
            })
            .await?;
        Ok(domains.clone())
    }

    async fn default_subnet(&self) -> Result<Option<String>, HunterError> {
        if let Some(subnet) = self.default_subnet.get() {
            return Ok(Some(subnet.clone()));
        }
        let found = self.lookup_subnet().await?;
        if let Some(subnet) = &found {
            let _ = self.default_subnet.set(subnet.clone());
        }
        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use serde_json::json;

    use super::super::signer::tests::TEST_KEY_PKCS8;
    use crate::provider::LifecycleState;

    fn client(server: &mockito::Server) -> OciClient {
        OciClient::new(OciSettings {
            compute_endpoint: server.url(),
            identity_endpoint: server.url(),
            compartment_id: "ocid1.compartment.test".to_string(),
            signer: None,
            auth_token: Some(SecretString::new("token-123".to_string())),
            timeout_seconds: 5,
        })
        .unwrap()
    }

    fn request() -> ProvisionRequest {
        ProvisionRequest {
            display_name: "AutoVM-20240101-120000-0001".to_string(),
            compartment_id: "ocid1.compartment.test".to_string(),
            shape: "VM.Standard.A1.Flex".to_string(),
            ocpus: 2,
            memory_gb: 12,
            boot_volume_gb: 50,
            image_id: "ocid1.image.test".to_string(),
            subnet_id: "ocid1.subnet.test".to_string(),
            availability_domain: "kIdk:AP-SEOUL-1-AD-1".to_string(),
            assign_public_ip: true,
        }
    }

    fn instance_json(state: &str) -> serde_json::Value {
        json!({
            "id": "ocid1.instance.test",
            "displayName": "AutoVM-20240101-120000-0001",
            "lifecycleState": state,
            "availabilityDomain": "kIdk:AP-SEOUL-1-AD-1",
            "shape": "VM.Standard.A1.Flex",
            "timeCreated": "2024-01-01T12:00:00.000Z"
        })
    }

    #[tokio::test]
    async fn launch_sends_oci_body_and_token() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/20160918/instances")
            .match_header("authorization", "Bearer token-123")
            .match_body(Matcher::PartialJson(json!({
                "compartmentId": "ocid1.compartment.test",
                "displayName": "AutoVM-20240101-120000-0001",
                "shapeConfig": {"ocpus": 2, "memoryInGBs": 12},
                "sourceDetails": {
                    "sourceType": "image",
                    "imageId": "ocid1.image.test",
                    "bootVolumeSizeInGBs": 50
                },
                "createVnicDetails": {"subnetId": "ocid1.subnet.test", "assignPublicIp": true}
            })))
            .with_status(200)
            .with_body(instance_json("PROVISIONING").to_string())
            .create_async()
            .await;

        let instance = client(&server).create_instance(&request()).await.unwrap();
        mock.assert_async().await;
        assert_eq!(instance.instance_id, "ocid1.instance.test");
        assert_eq!(instance.lifecycle_state, LifecycleState::Provisioning);
        assert_eq!(instance.public_ip, None);
    }

    fn signed_client(server: &mockito::Server) -> OciClient {
        let signer = RequestSigner::new(
            "ocid1.tenancy.oc1..t",
            "ocid1.user.oc1..u",
            "aa:bb:cc",
            TEST_KEY_PKCS8,
        )
        .unwrap();
        OciClient::new(OciSettings {
            compute_endpoint: server.url(),
            identity_endpoint: server.url(),
            compartment_id: "ocid1.compartment.test".to_string(),
            signer: Some(signer),
            auth_token: Some(SecretString::new("token-123".to_string())),
            timeout_seconds: 5,
        })
        .unwrap()
    }

    #[tokio::test]
    async fn api_key_signature_replaces_bearer_token() {
        let mut server = mockito::Server::new_async().await;
        let launch = server
            .mock("POST", "/20160918/instances")
            .match_header(
                "authorization",
                Matcher::Regex(
                    r#"^Signature version="1",keyId="ocid1\.tenancy\.oc1\.\.t/ocid1\.user\.oc1\.\.u/aa:bb:cc",algorithm="rsa-sha256",headers="date \(request-target\) host content-length content-type x-content-sha256",signature="[A-Za-z0-9+/=]+"$"#
                        .to_string(),
                ),
            )
            .match_header("x-content-sha256", Matcher::Any)
            .match_header("date", Matcher::Regex(r"GMT$".to_string()))
            .with_status(200)
            .with_body(instance_json("PROVISIONING").to_string())
            .create_async()
            .await;
        let fetch = server
            .mock("GET", "/20160918/instances/ocid1.instance.test")
            .match_header(
                "authorization",
                Matcher::Regex(r#"headers="date \(request-target\) host","#.to_string()),
            )
            .with_status(200)
            .with_body(instance_json("RUNNING").to_string())
            .create_async()
            .await;

        let client = signed_client(&server);
        client.create_instance(&request()).await.unwrap();
        assert!(client.is_running("ocid1.instance.test").await);
        launch.assert_async().await;
        fetch.assert_async().await;
    }

    #[test]
    fn settings_need_api_key_or_token() {
        let mut config = HunterConfig::default();
        config.provider.compartment_id = Some("ocid1.compartment.test".to_string());
        config.provider.user_id = Some("ocid1.user.oc1..u".to_string());
        assert!(matches!(
            OciSettings::from_config(&config),
            Err(ConfigError::Missing(_))
        ));

        config.provider.auth_token = Some(SecretString::new("proxy".to_string()));
        let settings = OciSettings::from_config(&config).unwrap();
        assert!(settings.signer.is_none());
        assert!(settings.auth_token.is_some());
    }

    #[test]
    fn settings_load_the_signing_key() {
        let dir = tempfile::tempdir().unwrap();
        let key_path = dir.path().join("oci_api_key.pem");
        std::fs::write(&key_path, TEST_KEY_PKCS8).unwrap();

        let mut config = HunterConfig::default();
        config.provider.tenancy_id = Some("ocid1.tenancy.oc1..t".to_string());
        config.provider.user_id = Some("ocid1.user.oc1..u".to_string());
        config.provider.fingerprint = Some("aa:bb:cc".to_string());
        config.provider.private_key_path = Some(key_path.display().to_string());

        let settings = OciSettings::from_config(&config).unwrap();
        assert_eq!(
            settings.signer.unwrap().key_id(),
            "ocid1.tenancy.oc1..t/ocid1.user.oc1..u/aa:bb:cc"
        );
        assert_eq!(settings.compartment_id, "ocid1.tenancy.oc1..t");
    }

    #[tokio::test]
    async fn capacity_error_surfaces_provider_message() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/20160918/instances")
            .with_status(500)
            .with_body(json!({"code": "InternalError", "message": "Out of host capacity."}).to_string())
            .create_async()
            .await;

        let err = client(&server).create_instance(&request()).await.unwrap_err();
        assert!(err.to_string().contains("Out of host capacity."));
    }

    #[tokio::test]
    async fn throttling_maps_to_rate_limited() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/20160918/instances")
            .with_status(429)
            .with_body(json!({"code": "TooManyRequests", "message": "Too many requests for the user"}).to_string())
            .create_async()
            .await;

        let err = client(&server).create_instance(&request()).await.unwrap_err();
        assert!(matches!(err, HunterError::RateLimited(_)));
        assert!(err.to_string().to_lowercase().contains("rate limit"));
    }

    #[tokio::test]
    async fn details_include_vnic_addresses() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/20160918/instances/ocid1.instance.test")
            .with_status(200)
            .with_body(instance_json("RUNNING").to_string())
            .create_async()
            .await;
        server
            .mock("GET", "/20160918/vnicAttachments")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("compartmentId".into(), "ocid1.compartment.test".into()),
                Matcher::UrlEncoded("instanceId".into(), "ocid1.instance.test".into()),
            ]))
            .with_status(200)
            .with_body(json!([{"vnicId": "ocid1.vnic.test"}]).to_string())
            .create_async()
            .await;
        server
            .mock("GET", "/20160918/vnics/ocid1.vnic.test")
            .with_status(200)
            .with_body(json!({"publicIp": "203.0.113.7", "privateIp": "10.0.0.12"}).to_string())
            .create_async()
            .await;

        let client = client(&server);
        let details = client
            .get_instance_details("ocid1.instance.test")
            .await
            .unwrap();
        assert_eq!(details.lifecycle_state, LifecycleState::Running);
        assert_eq!(details.public_ip.as_deref(), Some("203.0.113.7"));
        assert_eq!(details.private_ip.as_deref(), Some("10.0.0.12"));
        assert!(client.is_running("ocid1.instance.test").await);
    }

    #[tokio::test]
    async fn is_running_is_false_on_errors() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/20160918/instances/ocid1.instance.test")
            .with_status(503)
            .with_body("unavailable")
            .create_async()
            .await;
        assert!(!client(&server).is_running("ocid1.instance.test").await);
    }

    #[tokio::test]
    async fn terminate_reports_failure_without_erroring() {
        let mut server = mockito::Server::new_async().await;
        let ok = server
            .mock("DELETE", "/20160918/instances/ocid1.instance.ok")
            .with_status(204)
            .create_async()
            .await;
        server
            .mock("DELETE", "/20160918/instances/ocid1.instance.gone")
            .with_status(404)
            .with_body(json!({"code": "NotAuthorizedOrNotFound", "message": "gone"}).to_string())
            .create_async()
            .await;

        let client = client(&server);
        assert!(client.terminate_instance("ocid1.instance.ok").await);
        assert!(!client.terminate_instance("ocid1.instance.gone").await);
        ok.assert_async().await;
    }

    #[tokio::test]
    async fn availability_domains_are_cached() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/20160918/availabilityDomains")
            .match_query(Matcher::UrlEncoded(
                "compartmentId".into(),
                "ocid1.compartment.test".into(),
            ))
            .with_status(200)
            .with_body(json!([{"name": "AD-1"}, {"name": "AD-2"}]).to_string())
            .expect(1)
            .create_async()
            .await;

        let client = client(&server);
        assert_eq!(client.availability_domains().await.unwrap(), vec!["AD-1", "AD-2"]);
        assert_eq!(client.availability_domains().await.unwrap().len(), 2);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn default_subnet_prefers_public_subnets() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/20160918/vcns")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(json!([{"id": "ocid1.vcn.test", "displayName": "main"}]).to_string())
            .create_async()
            .await;
        let subnets = server
            .mock("GET", "/20160918/subnets")
            .match_query(Matcher::UrlEncoded("vcnId".into(), "ocid1.vcn.test".into()))
            .with_status(200)
            .with_body(
                json!([
                    {"id": "ocid1.subnet.private", "displayName": "private", "prohibitPublicIpOnVnic": true},
                    {"id": "ocid1.subnet.public", "displayName": "public", "prohibitPublicIpOnVnic": false}
                ])
                .to_string(),
            )
            .expect(1)
            .create_async()
            .await;

        let client = client(&server);
        assert_eq!(
            client.default_subnet().await.unwrap().as_deref(),
            Some("ocid1.subnet.public")
        );
        assert_eq!(
            client.default_subnet().await.unwrap().as_deref(),
            Some("ocid1.subnet.public")
        );
        subnets.assert_async().await;
    }

    #[tokio::test]
    async fn no_vcn_means_no_subnet() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/20160918/vcns")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body("[]")
            .create_async()
            .await;
        assert_eq!(client(&server).default_subnet().await.unwrap(), None);
    }
}
