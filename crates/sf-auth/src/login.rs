//! SOAP username/password login.
//!
//! Posts a partner-API `login` envelope and reads `serverUrl` and
//! `sessionId` out of the response by namespace-qualified element lookup.

use quick_xml::escape::escape;
use quick_xml::events::Event;
use quick_xml::name::{Namespace, ResolveResult};
use quick_xml::reader::NsReader;
use sfbulk_client::{ClientConfig, SfHttpClient};
use tracing::{debug, instrument};

use crate::credentials::SessionCredentials;
use crate::error::{Error, ErrorKind, Result};
use crate::PARTNER_NAMESPACE;

/// Outcome of a successful login.
///
/// The session id is redacted in Debug output.
#[derive(Clone)]
pub struct LoginResult {
    /// The `serverUrl` element as returned by the server.
    pub server_url: String,
    /// Scheme, host and port of `server_url`.
    pub instance_url: String,
    session_id: String,
}

impl std::fmt::Debug for LoginResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginResult")
            .field("server_url", &self.server_url)
            .field("instance_url", &self.instance_url)
            .field("session_id", &"[REDACTED]")
            .finish()
    }
}

impl LoginResult {
    /// Get the session id.
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Host name of the server URL.
    pub fn server_host(&self) -> Option<String> {
        url::Url::parse(&self.server_url)
            .ok()
            .and_then(|u| u.host_str().map(str::to_string))
    }

    /// Convert to SessionCredentials.
    pub fn to_credentials(&self, api_version: &str) -> SessionCredentials {
        SessionCredentials::new(&self.instance_url, &self.session_id, api_version)
    }
}

/// Log in with a username and password.
///
/// `login_host` is either a bare host (`login.salesforce.com`, HTTPS is
/// implied) or a full URL. The password must have the security token
/// appended when the org requires one.
pub async fn login(
    username: &str,
    password: &str,
    login_host: &str,
    api_version: &str,
) -> Result<LoginResult> {
    let http = SfHttpClient::new(ClientConfig::default())?;
    login_with_client(&http, username, password, login_host, api_version).await
}

/// Log in using an existing HTTP client.
#[instrument(skip(http, password))]
pub async fn login_with_client(
    http: &SfHttpClient,
    username: &str,
    password: &str,
    login_host: &str,
    api_version: &str,
) -> Result<LoginResult> {
    let endpoint = login_endpoint(login_host, api_version);
    let request = http
        .post(&endpoint)
        .xml(login_envelope(username, password))
        .header("SOAPAction", "login");

    let response = http.execute(request).await?;
    let status = response.status();
    let body = response.text().await?;
    debug!(status, "Login response received");

    if status >= 400 {
        if let Some((code, message)) = parse_fault(&body)? {
            return Err(Error::new(ErrorKind::LoginFault { code, message }));
        }
        return Err(Error::new(ErrorKind::Http(format!(
            "login request failed with status {}",
            status
        ))));
    }

    parse_login_response(&body)
}

/// Build the SOAP login endpoint for a login host.
pub(crate) fn login_endpoint(login_host: &str, api_version: &str) -> String {
    let base = if login_host.contains("://") {
        login_host.trim_end_matches('/').to_string()
    } else {
        format!("https://{}", login_host.trim_end_matches('/'))
    };
    format!("{}/services/Soap/u/{}", base, api_version)
}

pub(crate) fn login_envelope(username: &str, password: &str) -> String {
    format!(
        concat!(
            r#"<?xml version="1.0" encoding="utf-8" ?>"#,
            r#"<env:Envelope xmlns:xsd="http://www.w3.org/2001/XMLSchema""#,
            r#" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance""#,
            r#" xmlns:env="http://schemas.xmlsoap.org/soap/envelope/">"#,
            r#"<env:Body>"#,
            r#"<n1:login xmlns:n1="urn:partner.soap.sforce.com">"#,
            r#"<n1:username>{username}</n1:username>"#,
            r#"<n1:password>{password}</n1:password>"#,
            r#"</n1:login>"#,
            r#"</env:Body>"#,
            r#"</env:Envelope>"#,
        ),
        username = escape(username),
        password = escape(password),
    )
}

/// Extract `serverUrl` and `sessionId` from a login response.
pub(crate) fn parse_login_response(xml: &str) -> Result<LoginResult> {
    let server_url = find_partner_element(xml, "serverUrl")?
        .ok_or_else(|| Error::new(ErrorKind::MissingElement("serverUrl".to_string())))?;
    let session_id = find_partner_element(xml, "sessionId")?
        .ok_or_else(|| Error::new(ErrorKind::MissingElement("sessionId".to_string())))?;

    let instance_url = url::Url::parse(&server_url)?.origin().ascii_serialization();

    Ok(LoginResult {
        server_url,
        instance_url,
        session_id,
    })
}

/// First text value of `{urn:partner.soap.sforce.com}local_name`.
fn find_partner_element(xml: &str, local_name: &str) -> Result<Option<String>> {
    let mut reader = NsReader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut inside = false;
    loop {
        let (ns, event) = reader.read_resolved_event().map_err(xml_error)?;
        match event {
            Event::Start(e) => {
                let partner = matches!(
                    ns,
                    ResolveResult::Bound(Namespace(n)) if n == PARTNER_NAMESPACE.as_bytes()
                );
                inside = partner && e.local_name().as_ref() == local_name.as_bytes();
            }
            Event::Text(t) if inside => {
                let text = t.unescape().map_err(xml_error)?;
                return Ok(Some(text.into_owned()));
            }
            Event::End(_) if inside => return Ok(Some(String::new())),
            Event::Eof => return Ok(None),
            _ => {}
        }
    }
}

/// `faultcode` / `faultstring` of a SOAP fault, if the body carries one.
fn parse_fault(xml: &str) -> Result<Option<(String, String)>> {
    let mut reader = NsReader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut current: Option<Vec<u8>> = None;
    let mut code = None;
    let mut message = None;
    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => current = Some(e.local_name().as_ref().to_vec()),
            Ok(Event::Text(t)) => {
                let text = t.unescape().map_err(xml_error)?.into_owned();
                match current.as_deref() {
                    Some(b"faultcode") => code = Some(text),
                    Some(b"faultstring") => message = Some(text),
                    _ => {}
                }
            }
            Ok(Event::End(_)) => current = None,
            Ok(Event::Eof) => break,
            Ok(_) => {}
            // A non-XML error body simply has no fault.
            Err(_) => return Ok(None),
        }
    }

    Ok(code.map(|c| (c, message.unwrap_or_else(|| "Unknown error".to_string()))))
}

fn xml_error(err: impl std::fmt::Display) -> Error {
    Error::new(ErrorKind::Xml(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_string_contains, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn login_response(server_url: &str) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<soapenv:Envelope xmlns:soapenv="http://schemas.xmlsoap.org/soap/envelope/"
    xmlns="urn:partner.soap.sforce.com"
    xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">
  <soapenv:Body>
    <loginResponse>
      <result>
        <metadataServerUrl>{server_url}/services/Soap/m/36.0/00D</metadataServerUrl>
        <passwordExpired>false</passwordExpired>
        <sandbox>false</sandbox>
        <serverUrl>{server_url}/services/Soap/u/36.0/00D</serverUrl>
        <sessionId>00Dxx0000001gEF!AQcAQH</sessionId>
        <userId>005xx000001Sv6AAAS</userId>
      </result>
    </loginResponse>
  </soapenv:Body>
</soapenv:Envelope>"#
        )
    }

    const FAULT: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<soapenv:Envelope xmlns:soapenv="http://schemas.xmlsoap.org/soap/envelope/"
    xmlns:sf="urn:fault.partner.soap.sforce.com">
  <soapenv:Body>
    <soapenv:Fault>
      <faultcode>sf:INVALID_LOGIN</faultcode>
      <faultstring>INVALID_LOGIN: Invalid username, password, security token; or user locked out.</faultstring>
    </soapenv:Fault>
  </soapenv:Body>
</soapenv:Envelope>"#;

    #[test]
    fn test_login_endpoint() {
        assert_eq!(
            login_endpoint("login.salesforce.com", "36.0"),
            "https://login.salesforce.com/services/Soap/u/36.0"
        );
        assert_eq!(
            login_endpoint("https://test.salesforce.com/", "47.0"),
            "https://test.salesforce.com/services/Soap/u/47.0"
        );
        assert_eq!(
            login_endpoint("http://127.0.0.1:8080", "36.0"),
            "http://127.0.0.1:8080/services/Soap/u/36.0"
        );
    }

    #[test]
    fn test_envelope_escapes_credentials() {
        let envelope = login_envelope("a&b@example.com", "p<w>d\"");
        assert!(envelope.contains("<n1:username>a&amp;b@example.com</n1:username>"));
        assert!(envelope.contains("<n1:password>p&lt;w&gt;d&quot;</n1:password>"));
        assert!(envelope.contains(r#"xmlns:n1="urn:partner.soap.sforce.com""#));
    }

    #[test]
    fn test_parse_login_response() {
        let result = parse_login_response(&login_response("https://na1.salesforce.com")).unwrap();

        assert_eq!(
            result.server_url,
            "https://na1.salesforce.com/services/Soap/u/36.0/00D"
        );
        assert_eq!(result.instance_url, "https://na1.salesforce.com");
        assert_eq!(result.server_host().as_deref(), Some("na1.salesforce.com"));
        assert_eq!(result.session_id(), "00Dxx0000001gEF!AQcAQH");
    }

    #[test]
    fn test_parse_ignores_other_namespaces() {
        let xml = r#"<root xmlns:x="urn:other">
            <x:serverUrl>https://evil.example.com</x:serverUrl>
            <p:serverUrl xmlns:p="urn:partner.soap.sforce.com">https://na2.salesforce.com/x</p:serverUrl>
            <p:sessionId xmlns:p="urn:partner.soap.sforce.com">sid</p:sessionId>
        </root>"#;

        let result = parse_login_response(xml).unwrap();
        assert_eq!(result.instance_url, "https://na2.salesforce.com");
    }

    #[test]
    fn test_parse_missing_session_id() {
        let xml = r#"<result xmlns="urn:partner.soap.sforce.com">
            <serverUrl>https://na1.salesforce.com/services/Soap/u/36.0</serverUrl>
        </result>"#;

        let err = parse_login_response(xml).unwrap_err();
        assert!(matches!(err.kind, ErrorKind::MissingElement(ref name) if name == "sessionId"));
    }

    #[test]
    fn test_parse_missing_server_url() {
        let xml = r#"<result xmlns="urn:partner.soap.sforce.com"><sessionId>sid</sessionId></result>"#;

        let err = parse_login_response(xml).unwrap_err();
        assert!(matches!(err.kind, ErrorKind::MissingElement(ref name) if name == "serverUrl"));
    }

    #[test]
    fn test_parse_fault() {
        let (code, message) = parse_fault(FAULT).unwrap().unwrap();
        assert_eq!(code, "sf:INVALID_LOGIN");
        assert!(message.starts_with("INVALID_LOGIN"));

        assert!(parse_fault("plain text").unwrap().is_none());
    }

    #[test]
    fn test_login_result_debug_redacts_session() {
        let result = parse_login_response(&login_response("https://na1.salesforce.com")).unwrap();
        let debug_output = format!("{:?}", result);
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("AQcAQH"));
    }

    #[tokio::test]
    async fn test_login_round_trip() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/services/Soap/u/36.0"))
            .and(header("SOAPAction", "login"))
            .and(header("Content-Type", "text/xml; charset=UTF-8"))
            .and(body_string_contains("<n1:username>user@example.com</n1:username>"))
            .respond_with(
                ResponseTemplate::new(200).set_body_string(login_response(&mock_server.uri())),
            )
            .expect(1)
            .mount(&mock_server)
            .await;

        let result = login("user@example.com", "secretTOKEN", &mock_server.uri(), "36.0")
            .await
            .unwrap();

        assert_eq!(result.instance_url, mock_server.uri());
        assert_eq!(result.session_id(), "00Dxx0000001gEF!AQcAQH");

        let creds = result.to_credentials("36.0");
        assert_eq!(crate::Credentials::instance_url(&creds), mock_server.uri());
    }

    #[tokio::test]
    async fn test_login_fault() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/services/Soap/u/36.0"))
            .respond_with(ResponseTemplate::new(500).set_body_string(FAULT))
            .mount(&mock_server)
            .await;

        let err = login("user@example.com", "wrong", &mock_server.uri(), "36.0")
            .await
            .unwrap_err();

        assert!(matches!(
            err.kind,
            ErrorKind::LoginFault { ref code, .. } if code == "sf:INVALID_LOGIN"
        ));
    }

    #[tokio::test]
    async fn test_login_response_without_session() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/services/Soap/u/36.0"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"<Envelope xmlns="urn:partner.soap.sforce.com"><serverUrl>https://na1.salesforce.com</serverUrl></Envelope>"#,
            ))
            .mount(&mock_server)
            .await;

        let err = login("user@example.com", "pw", &mock_server.uri(), "36.0")
            .await
            .unwrap_err();

        assert!(matches!(err.kind, ErrorKind::MissingElement(_)));
    }
}
