//! Integration tests for the token issuance core.
//!
//! Every test drives a fully wired [`AuthServer`] backed by the in-memory
//! stores, the way an HTTP layer would.

use std::time::Duration;

use time::OffsetDateTime;

use tessera_auth::config::SigningConfig;
use tessera_auth::jwt::{
    ClaimsParameter, ContentEncryptionAlgorithm, InMemoryKeyStore, KeyManagementAlgorithm,
    SigningAlgorithm,
};
use tessera_auth::oauth::{
    AuthorizationOutcome, AuthorizationParameter, ClientAuthParameters,
    DeviceAuthorizationRequest, PkceChallengeMethod, TokenRequest,
};
use tessera_auth::storage::{AuthorizationCodeStore, TicketStore};
use tessera_auth::storage::memory::InMemoryStores;
use tessera_auth::token::{IntrospectionRequest, RevocationRequest, UserInfoResponse};
use tessera_auth::types::{
    Claim, ClaimsPrincipal, Client, ClientSecret, Consent, GrantType, Policy, PolicyRule,
    ResourceOwner, ResourceSet, ResponseType, Ticket, TicketLine, TokenEndpointAuthMethod,
};
use tessera_auth::{AuthConfig, AuthServer, AuthServerBuilder, ErrorCode, GrantedToken};

const ISSUER: &str = "https://auth.example.com";
const CALLBACK: &str = "https://web.example.com/cb";
const SECRET: &str = "secret";

// RFC 7636 appendix B
const VERIFIER: &str = "dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk";
const CHALLENGE: &str = "E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM";

// =============================================================================
// Fixture
// =============================================================================

struct Fixture {
    server: AuthServer,
    stores: InMemoryStores,
}

fn config() -> AuthConfig {
    AuthConfig {
        issuer: ISSUER.to_string(),
        signing: SigningConfig {
            default_algorithm: SigningAlgorithm::ES384,
            algorithms: vec![SigningAlgorithm::ES384],
            encryption_enabled: false,
        },
        ..AuthConfig::default()
    }
}

fn confidential(client_id: &str, grant_types: Vec<GrantType>, scopes: &[&str]) -> Client {
    let mut client = Client::new(client_id, grant_types);
    client.secrets = vec![ClientSecret::shared(SECRET)];
    client.token_endpoint_auth_method = TokenEndpointAuthMethod::ClientSecretPost;
    client.allowed_scopes = scopes.iter().map(|s| (*s).to_string()).collect();
    client
}

fn fixture() -> Fixture {
    let config = config();
    let stores = InMemoryStores::new();
    stores.scopes.seed_if_empty(&config.claims);

    stores.clients.insert(confidential(
        "clientCredentials",
        vec![GrantType::ClientCredentials],
        &["api1"],
    ));

    let mut web = confidential(
        "web",
        vec![GrantType::AuthorizationCode, GrantType::RefreshToken],
        &["openid", "profile", "offline_access"],
    );
    web.response_types = vec![ResponseType::Code];
    web.redirect_uris = vec![CALLBACK.to_string()];
    stores.clients.insert(web);

    let mut pkce = Client::new("pkce_client", vec![GrantType::AuthorizationCode]);
    pkce.token_endpoint_auth_method = TokenEndpointAuthMethod::None;
    pkce.response_types = vec![ResponseType::Code];
    pkce.redirect_uris = vec![CALLBACK.to_string()];
    pkce.require_pkce = true;
    stores.clients.insert(pkce);

    let mut hybrid = confidential(
        "hybrid",
        vec![GrantType::AuthorizationCode, GrantType::Implicit],
        &["openid"],
    );
    hybrid.response_types = vec![ResponseType::Code, ResponseType::Token, ResponseType::IdToken];
    hybrid.redirect_uris = vec![CALLBACK.to_string()];
    let mut hybrid_encrypted = hybrid.clone();
    hybrid_encrypted.client_id = "hybrid_encrypted".to_string();
    hybrid_encrypted.id_token_encrypted_response_alg = Some(KeyManagementAlgorithm::RsaOaep256);
    hybrid_encrypted.id_token_encrypted_response_enc = Some(ContentEncryptionAlgorithm::A256GCM);
    stores.clients.insert(hybrid);
    stores.clients.insert(hybrid_encrypted);

    stores
        .clients
        .insert(confidential("other", vec![GrantType::RefreshToken], &[]));
    stores.clients.insert(confidential(
        "tv",
        vec![GrantType::DeviceCode],
        &["openid", "profile"],
    ));
    stores.clients.insert(confidential(
        "mobile",
        vec![GrantType::Password],
        &["openid", "profile"],
    ));
    stores
        .clients
        .insert(confidential("rpt_client", vec![GrantType::UmaTicket], &[]));
    stores.clients.insert(confidential(
        "resource_server",
        vec![GrantType::ClientCredentials],
        &[],
    ));

    stores.resource_owners.insert(
        ResourceOwner::with_password("alice", "password", vec![Claim::new("name", "Alice")])
            .expect("Failed to hash password"),
    );
    stores.consents.insert(Consent {
        id: "consent-1".to_string(),
        subject: "alice".to_string(),
        client_id: "web".to_string(),
        scopes: vec![
            "openid".to_string(),
            "profile".to_string(),
            "offline_access".to_string(),
        ],
        claims: vec!["name".to_string()],
    });
    stores.consents.insert(Consent {
        id: "consent-2".to_string(),
        subject: "alice".to_string(),
        client_id: "pkce_client".to_string(),
        scopes: vec!["openid".to_string()],
        claims: Vec::new(),
    });
    for (id, client_id) in [("consent-3", "hybrid"), ("consent-4", "hybrid_encrypted")] {
        stores.consents.insert(Consent {
            id: id.to_string(),
            subject: "alice".to_string(),
            client_id: client_id.to_string(),
            scopes: vec!["openid".to_string()],
            claims: Vec::new(),
        });
    }

    let key_store = std::sync::Arc::new(
        InMemoryKeyStore::generate(&config.signing).expect("Failed to generate keys"),
    );
    let server = AuthServerBuilder::new(config, stores.stores(), key_store)
        .build()
        .expect("Failed to build server");

    Fixture { server, stores }
}

fn credentials(client_id: &str) -> ClientAuthParameters {
    ClientAuthParameters {
        client_id: Some(client_id.to_string()),
        client_secret: Some(SECRET.to_string()),
        ..ClientAuthParameters::default()
    }
}

fn public_client(client_id: &str) -> ClientAuthParameters {
    ClientAuthParameters {
        client_id: Some(client_id.to_string()),
        ..ClientAuthParameters::default()
    }
}

fn alice() -> ClaimsPrincipal {
    ClaimsPrincipal::new(vec![Claim::new("sub", "alice"), Claim::new("name", "Alice")])
}

fn code_request(client_id: &str, scope: &str) -> AuthorizationParameter {
    AuthorizationParameter {
        client_id: client_id.to_string(),
        redirect_uri: Some(CALLBACK.to_string()),
        scope: scope.to_string(),
        response_types: vec![ResponseType::Code],
        state: Some("xyz".to_string()),
        ..AuthorizationParameter::default()
    }
}

async fn authorize_code(fixture: &Fixture, params: &AuthorizationParameter) -> String {
    let outcome = fixture
        .server
        .authorize(params, Some(&alice()))
        .await
        .expect("Authorization failed");
    assert_eq!(outcome.parameter("state"), Some("xyz"));
    outcome
        .parameter("code")
        .expect("No code in callback")
        .to_string()
}

fn code_exchange(client: ClientAuthParameters, code: &str, verifier: Option<&str>) -> TokenRequest {
    TokenRequest {
        grant_type: "authorization_code".to_string(),
        client,
        code: Some(code.to_string()),
        redirect_uri: Some(CALLBACK.to_string()),
        code_verifier: verifier.map(str::to_string),
        ..TokenRequest::default()
    }
}

async fn client_credentials_token(fixture: &Fixture) -> GrantedToken {
    let request = TokenRequest {
        grant_type: "client_credentials".to_string(),
        client: credentials("clientCredentials"),
        scope: Some("api1".to_string()),
        ..TokenRequest::default()
    };
    fixture
        .server
        .token(&request, None, None)
        .await
        .expect("Token request failed")
}

// =============================================================================
// Client Credentials
// =============================================================================

#[tokio::test]
async fn test_client_credentials_issues_bearer_token() {
    let fixture = fixture();
    let token = client_credentials_token(&fixture).await;

    assert_eq!(token.token_type, "bearer");
    assert_eq!(token.scope, "api1");
    assert_eq!(token.expires_in, 3600);
    assert!(token.refresh_token.is_none());
    assert!(token.id_token.is_none());
    assert!(!token.access_token.is_empty());
}

#[tokio::test]
async fn test_client_credentials_reuses_valid_token() {
    let fixture = fixture();
    let first = client_credentials_token(&fixture).await;
    let second = client_credentials_token(&fixture).await;

    assert_eq!(first.access_token, second.access_token);
    assert_eq!(fixture.stores.tokens.len(), 1);
}

#[tokio::test]
async fn test_wrong_secret_is_invalid_client() {
    let fixture = fixture();
    let request = TokenRequest {
        grant_type: "client_credentials".to_string(),
        client: ClientAuthParameters {
            client_secret: Some("nope".to_string()),
            ..credentials("clientCredentials")
        },
        ..TokenRequest::default()
    };

    let err = fixture.server.token(&request, None, None).await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::InvalidClient);
}

#[tokio::test]
async fn test_unknown_grant_type() {
    let fixture = fixture();
    let request = TokenRequest {
        grant_type: "urn:example:magic".to_string(),
        client: credentials("clientCredentials"),
        ..TokenRequest::default()
    };

    let err = fixture.server.token(&request, None, None).await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::UnsupportedGrantType);
}

// =============================================================================
// Authorization Code
// =============================================================================

#[tokio::test]
async fn test_code_flow_with_offline_access() {
    let fixture = fixture();
    let code = authorize_code(&fixture, &code_request("web", "openid profile offline_access")).await;

    let token = fixture
        .server
        .token(&code_exchange(credentials("web"), &code, None), None, None)
        .await
        .unwrap();

    assert_eq!(token.client_id, "web");
    assert!(token.refresh_token.is_some());
    assert!(token.id_token.is_some());
    assert_eq!(token.subject(), Some("alice"));
}

#[tokio::test]
async fn test_code_cannot_be_redeemed_twice() {
    let fixture = fixture();
    let code = authorize_code(&fixture, &code_request("web", "openid")).await;
    let request = code_exchange(credentials("web"), &code, None);

    fixture.server.token(&request, None, None).await.unwrap();
    let err = fixture.server.token(&request, None, None).await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::InvalidGrant);
}

#[tokio::test]
async fn test_expired_code_is_rejected_and_kept() {
    let fixture = fixture();
    let code = authorize_code(&fixture, &code_request("web", "openid")).await;

    let mut stored = fixture
        .stores
        .authorization_codes
        .get(&code)
        .await
        .unwrap()
        .unwrap();
    stored.create_time -= Duration::from_secs(3600);
    fixture.stores.authorization_codes.add(stored).await.unwrap();

    let err = fixture
        .server
        .token(&code_exchange(credentials("web"), &code, None), None, None)
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::ExpiredAuthorizationCode);
    assert_eq!(fixture.stores.authorization_codes.len(), 1);
    assert!(fixture.stores.tokens.is_empty());
}

#[tokio::test]
async fn test_code_redirect_uri_mismatch() {
    let fixture = fixture();
    let code = authorize_code(&fixture, &code_request("web", "openid")).await;
    let mut request = code_exchange(credentials("web"), &code, None);
    request.redirect_uri = Some("https://evil.example.com/cb".to_string());

    let err = fixture.server.token(&request, None, None).await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::InvalidGrant);
}

#[tokio::test]
async fn test_pkce_wrong_verifier_is_rejected() {
    let fixture = fixture();
    let mut params = code_request("pkce_client", "openid");
    params.code_challenge = Some(CHALLENGE.to_string());
    params.code_challenge_method = Some(PkceChallengeMethod::S256);
    let code = authorize_code(&fixture, &params).await;

    let wrong = "wrongwrongwrongwrongwrongwrongwrongwrongwrong";
    let err = fixture
        .server
        .token(&code_exchange(public_client("pkce_client"), &code, Some(wrong)), None, None)
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::InvalidRequest);
    assert!(err.to_string().contains("The code verifier is not correct"));

    let token = fixture
        .server
        .token(&code_exchange(public_client("pkce_client"), &code, Some(VERIFIER)), None, None)
        .await
        .unwrap();
    assert_eq!(token.client_id, "pkce_client");
}

#[tokio::test]
async fn test_pkce_required_at_authorization() {
    let fixture = fixture();
    let err = fixture
        .server
        .authorize(&code_request("pkce_client", "openid"), Some(&alice()))
        .await
        .unwrap_err();

    assert_eq!(err.code(), ErrorCode::InvalidRequest);
    assert_eq!(err.to_details().state.as_deref(), Some("xyz"));
}

#[tokio::test]
async fn test_authorization_without_session_redirects_to_login() {
    let fixture = fixture();
    let outcome = fixture
        .server
        .authorize(&code_request("web", "openid"), None)
        .await
        .unwrap();
    assert_eq!(outcome, AuthorizationOutcome::RedirectToLogin);
}

#[tokio::test]
async fn test_authorization_without_consent_redirects_to_consent() {
    let fixture = fixture();
    let bob = ClaimsPrincipal::new(vec![Claim::new("sub", "bob")]);
    let outcome = fixture
        .server
        .authorize(&code_request("web", "openid"), Some(&bob))
        .await
        .unwrap();
    assert_eq!(outcome, AuthorizationOutcome::RedirectToConsent);
}

#[tokio::test]
async fn test_unsatisfied_essential_claim_keeps_state() {
    let fixture = fixture();
    let mut params = code_request("web", "openid");
    params.claims =
        ClaimsParameter::parse(r#"{"id_token":{"name":{"essential":true,"value":"Bob"}}}"#)
            .unwrap();

    let err = fixture
        .server
        .authorize(&params, Some(&alice()))
        .await
        .unwrap_err();

    assert_eq!(err.code(), ErrorCode::InvalidGrant);
    assert!(err.to_string().contains("The claim name is not valid"));
    assert_eq!(err.to_details().state.as_deref(), Some("xyz"));
}

fn hybrid_request(client_id: &str) -> AuthorizationParameter {
    AuthorizationParameter {
        response_types: vec![ResponseType::Code, ResponseType::Token, ResponseType::IdToken],
        nonce: Some("n-0S6_WzA2Mj".to_string()),
        ..code_request(client_id, "openid")
    }
}

#[tokio::test]
async fn test_hybrid_flow_returns_code_token_and_id_token() {
    let fixture = fixture();
    let outcome = fixture
        .server
        .authorize(&hybrid_request("hybrid"), Some(&alice()))
        .await
        .unwrap();

    assert!(outcome.parameter("code").is_some());
    assert!(outcome.parameter("access_token").is_some());
    assert!(outcome.parameter("id_token").is_some());
    assert_eq!(outcome.parameter("state"), Some("xyz"));
    assert_eq!(fixture.stores.authorization_codes.len(), 1);
    assert_eq!(fixture.stores.tokens.len(), 1);
}

#[tokio::test]
async fn test_failed_hybrid_request_stores_nothing() {
    let fixture = fixture();

    // the client asks for encrypted ID tokens but registered no keys
    let err = fixture
        .server
        .authorize(&hybrid_request("hybrid_encrypted"), Some(&alice()))
        .await
        .unwrap_err();

    assert_eq!(err.code(), ErrorCode::InvalidClient);
    assert_eq!(err.to_details().state.as_deref(), Some("xyz"));
    assert!(fixture.stores.authorization_codes.is_empty());
    assert!(fixture.stores.tokens.is_empty());
}

// =============================================================================
// Refresh Token
// =============================================================================

#[tokio::test]
async fn test_refresh_token_bound_to_client() {
    let fixture = fixture();
    let code = authorize_code(&fixture, &code_request("web", "openid offline_access")).await;
    let token = fixture
        .server
        .token(&code_exchange(credentials("web"), &code, None), None, None)
        .await
        .unwrap();
    let refresh_token = token.refresh_token.clone().unwrap();

    let stolen = TokenRequest {
        grant_type: "refresh_token".to_string(),
        client: credentials("other"),
        refresh_token: Some(refresh_token.clone()),
        ..TokenRequest::default()
    };
    let err = fixture.server.token(&stolen, None, None).await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::InvalidGrant);

    let refresh = TokenRequest {
        client: credentials("web"),
        ..stolen
    };
    let refreshed = fixture.server.token(&refresh, None, None).await.unwrap();
    assert_ne!(refreshed.access_token, token.access_token);
    assert_eq!(refreshed.parent_token_id.as_deref(), Some(token.id.as_str()));
    assert_eq!(refreshed.scope, token.scope);
}

#[tokio::test]
async fn test_refresh_cannot_widen_scope() {
    let fixture = fixture();
    let code = authorize_code(&fixture, &code_request("web", "openid offline_access")).await;
    let token = fixture
        .server
        .token(&code_exchange(credentials("web"), &code, None), None, None)
        .await
        .unwrap();

    let request = TokenRequest {
        grant_type: "refresh_token".to_string(),
        client: credentials("web"),
        refresh_token: token.refresh_token,
        scope: Some("openid profile".to_string()),
        ..TokenRequest::default()
    };
    let err = fixture.server.token(&request, None, None).await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::InvalidScope);
}

// =============================================================================
// Resource Owner Password and User Info
// =============================================================================

#[tokio::test]
async fn test_password_grant_and_userinfo() {
    let fixture = fixture();
    let request = TokenRequest {
        grant_type: "password".to_string(),
        client: credentials("mobile"),
        username: Some("alice".to_string()),
        password: Some("password".to_string()),
        scope: Some("openid profile".to_string()),
        ..TokenRequest::default()
    };
    let token = fixture.server.token(&request, None, None).await.unwrap();
    assert!(token.id_token.is_some());

    match fixture.server.userinfo(&token.access_token).await.unwrap() {
        UserInfoResponse::Json(payload) => {
            assert_eq!(payload.subject(), Some("alice"));
            assert_eq!(payload.get_str("name"), Some("Alice"));
        }
        other => panic!("Expected JSON user info, got {other:?}"),
    }
}

#[tokio::test]
async fn test_password_grant_wrong_password() {
    let fixture = fixture();
    let request = TokenRequest {
        grant_type: "password".to_string(),
        client: credentials("mobile"),
        username: Some("alice".to_string()),
        password: Some("guess".to_string()),
        ..TokenRequest::default()
    };
    let err = fixture.server.token(&request, None, None).await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::InvalidGrant);
}

#[tokio::test]
async fn test_userinfo_unknown_token() {
    let fixture = fixture();
    let err = fixture.server.userinfo("unknown").await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::InvalidToken);
}

// =============================================================================
// Device Code
// =============================================================================

#[tokio::test]
async fn test_device_flow_polling_states() {
    let fixture = fixture();
    let response = fixture
        .server
        .device_authorization(
            &DeviceAuthorizationRequest {
                client: credentials("tv"),
                scope: Some("openid profile".to_string()),
            },
            None,
            None,
        )
        .await
        .unwrap();

    assert_eq!(response.user_code.len(), 9);
    assert_eq!(response.interval, 5);
    assert!(response.verification_uri_complete.contains("user_code="));

    let poll = TokenRequest {
        grant_type: "urn:ietf:params:oauth:grant-type:device_code".to_string(),
        client: credentials("tv"),
        device_code: Some(response.device_code.clone()),
        ..TokenRequest::default()
    };

    let err = fixture.server.token(&poll, None, None).await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::AuthorizationPending);

    let err = fixture.server.token(&poll, None, None).await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::SlowDown);

    let typed = response.user_code.replace('-', "").to_lowercase();
    fixture.server.confirm_device(&typed, "alice").await.unwrap();

    let token = fixture.server.token(&poll, None, None).await.unwrap();
    assert_eq!(token.subject(), Some("alice"));
    assert!(token.id_token.is_some());

    let err = fixture
        .server
        .confirm_device(&response.user_code, "alice")
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::InvalidGrant);
}

#[tokio::test]
async fn test_device_code_of_another_client() {
    let fixture = fixture();
    let response = fixture
        .server
        .device_authorization(
            &DeviceAuthorizationRequest {
                client: credentials("tv"),
                scope: None,
            },
            None,
            None,
        )
        .await
        .unwrap();

    fixture
        .stores
        .clients
        .insert(confidential("tv2", vec![GrantType::DeviceCode], &[]));
    let poll = TokenRequest {
        grant_type: "urn:ietf:params:oauth:grant-type:device_code".to_string(),
        client: credentials("tv2"),
        device_code: Some(response.device_code),
        ..TokenRequest::default()
    };
    let err = fixture.server.token(&poll, None, None).await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::InvalidGrant);
}

// =============================================================================
// UMA Ticket
// =============================================================================

fn ticket(is_authorized_by_ro: bool) -> Ticket {
    let now = OffsetDateTime::now_utc();
    Ticket {
        id: "ticket-1".to_string(),
        client_id: "resource_server".to_string(),
        lines: vec![TicketLine {
            resource_set_id: "photos".to_string(),
            scopes: vec!["read".to_string()],
        }],
        expires_at: now + Duration::from_secs(300),
        create_date_time: now,
        not_before: now,
        is_authorized_by_ro,
        audience: vec!["resource_server".to_string()],
    }
}

fn photos(rule: PolicyRule) -> ResourceSet {
    ResourceSet {
        id: "photos".to_string(),
        name: "Photo album".to_string(),
        owner: Some("alice".to_string()),
        scopes: vec!["read".to_string(), "write".to_string()],
        policies: vec![Policy {
            id: "policy-1".to_string(),
            rules: vec![rule],
        }],
    }
}

fn ticket_request() -> TokenRequest {
    TokenRequest {
        grant_type: "urn:ietf:params:oauth:grant-type:uma-ticket".to_string(),
        client: credentials("rpt_client"),
        ticket: Some("ticket-1".to_string()),
        ..TokenRequest::default()
    }
}

#[tokio::test]
async fn test_uma_ticket_requires_owner_consent() {
    let fixture = fixture();
    fixture.stores.resource_sets.insert(photos(PolicyRule {
        id: "rule-1".to_string(),
        is_resource_owner_consent_needed: true,
        ..PolicyRule::default()
    }));
    fixture.stores.tickets.add(ticket(false)).await.unwrap();

    let err = fixture
        .server
        .token(&ticket_request(), None, None)
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::RequestSubmitted);
    assert!(fixture.stores.tickets.get("ticket-1").await.unwrap().is_some());

    fixture.stores.tickets.add(ticket(true)).await.unwrap();
    let rpt = fixture.server.token(&ticket_request(), None, None).await.unwrap();
    assert_eq!(rpt.scope, "read");
    assert_eq!(rpt.client_id, "rpt_client");
    assert!(fixture.stores.tickets.get("ticket-1").await.unwrap().is_none());

    let introspection = fixture
        .server
        .introspect_uma(
            &IntrospectionRequest {
                token: rpt.access_token,
                token_type_hint: None,
                client: credentials("resource_server"),
            },
            None,
            None,
        )
        .await
        .unwrap();
    assert!(introspection.active);
    let json = serde_json::to_value(&introspection).unwrap();
    assert_eq!(json["scope"], serde_json::json!(["read"]));
}

#[tokio::test]
async fn test_uma_ticket_needs_claims() {
    let fixture = fixture();
    fixture.stores.resource_sets.insert(photos(PolicyRule {
        id: "rule-1".to_string(),
        claims: vec![tessera_auth::types::RequiredClaim {
            claim_type: "role".to_string(),
            value: "friend".to_string(),
            friendly_name: None,
        }],
        openid_provider: Some(ISSUER.to_string()),
        ..PolicyRule::default()
    }));
    fixture.stores.tickets.add(ticket(true)).await.unwrap();

    let err = fixture
        .server
        .token(&ticket_request(), None, None)
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::NeedInfo);

    let details = err.to_details().error_details.unwrap();
    let claims = &details.requesting_party_claims;
    assert_eq!(claims.required_claims.len(), 1);
    assert_eq!(claims.required_claims[0].name, "role");
}

#[tokio::test]
async fn test_uma_ticket_client_not_allowed() {
    let fixture = fixture();
    fixture.stores.resource_sets.insert(photos(PolicyRule {
        id: "rule-1".to_string(),
        client_ids_allowed: vec!["someone_else".to_string()],
        ..PolicyRule::default()
    }));
    fixture.stores.tickets.add(ticket(true)).await.unwrap();

    let err = fixture
        .server
        .token(&ticket_request(), None, None)
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::NotAuthorized);
}

// =============================================================================
// Introspection and Revocation
// =============================================================================

#[tokio::test]
async fn test_introspection_of_unknown_token_is_inactive() {
    let fixture = fixture();
    let response = fixture
        .server
        .introspect(
            &IntrospectionRequest {
                token: "unknown".to_string(),
                token_type_hint: None,
                client: credentials("resource_server"),
            },
            None,
            None,
        )
        .await
        .unwrap();

    assert!(!response.active);
    assert_eq!(
        serde_json::to_value(&response).unwrap(),
        serde_json::json!({ "active": false })
    );
}

#[tokio::test]
async fn test_introspection_of_active_token() {
    let fixture = fixture();
    let token = client_credentials_token(&fixture).await;

    let response = fixture
        .server
        .introspect(
            &IntrospectionRequest {
                token: token.access_token.clone(),
                token_type_hint: None,
                client: credentials("resource_server"),
            },
            None,
            None,
        )
        .await
        .unwrap();

    assert!(response.active);
    assert_eq!(response.client_id.as_deref(), Some("clientCredentials"));
    assert_eq!(response.iss.as_deref(), Some(ISSUER));
    assert_eq!(response.jti.as_deref(), Some(token.id.as_str()));
}

#[tokio::test]
async fn test_revocation_by_another_client() {
    let fixture = fixture();
    let token = client_credentials_token(&fixture).await;

    let request = RevocationRequest {
        token: token.access_token.clone(),
        token_type_hint: None,
        client: credentials("resource_server"),
    };
    let err = fixture.server.revoke(&request, None, None).await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::InvalidClient);

    let own = RevocationRequest {
        client: credentials("clientCredentials"),
        ..request
    };
    fixture.server.revoke(&own, None, None).await.unwrap();

    let err = fixture.server.revoke(&own, None, None).await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::InvalidToken);
    assert_eq!(fixture.stores.tokens.len(), 0);
}

// =============================================================================
// Keys and Configuration
// =============================================================================

#[tokio::test]
async fn test_jwks_publishes_signing_key() {
    let fixture = fixture();
    let jwks = fixture.server.jwks().await.unwrap();
    assert_eq!(jwks.keys.len(), 1);
    assert!(jwks.keys[0].common.key_id.is_some());
}

#[test]
fn test_invalid_configuration_is_rejected() {
    let config = AuthConfig {
        issuer: String::new(),
        ..config()
    };
    let key_store = std::sync::Arc::new(InMemoryKeyStore::new(SigningAlgorithm::ES384));
    let err = AuthServerBuilder::new(config, InMemoryStores::new().stores(), key_store)
        .build()
        .err()
        .unwrap();
    assert_eq!(err.code(), ErrorCode::ServerError);
    assert!(err.to_string().contains("issuer"));
}
