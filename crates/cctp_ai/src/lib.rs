pub mod draft;
pub mod guardrails;
pub mod knowledge;
pub mod llm;
pub mod openai;
pub mod retrieve;

#[cfg(test)]
mod tests {
    use super::guardrails::clean_generated_text;
    use super::openai::OpenAiClient;

    #[test]
    fn client_requires_key_and_http_base_url() {
        assert!(OpenAiClient::new("https://api.openai.com/v1", "sk-test", 30).is_ok());
        assert!(OpenAiClient::new("http://127.0.0.1:8080/v1/", "sk-test", 30).is_ok());

        let err = OpenAiClient::new("https://api.openai.com/v1", "  ", 30).expect_err("blank key");
        assert_eq!(err.code, "AI_NOT_CONFIGURED");
        assert!(OpenAiClient::new("ftp://api.openai.com", "sk-test", 30).is_err());
        assert!(OpenAiClient::new("", "sk-test", 30).is_err());
    }

    #[test]
    fn health_check_reports_unreachable_service() {
        let port = std::net::TcpListener::bind("127.0.0.1:0")
            .and_then(|l| l.local_addr())
            .expect("free port")
            .port();
        let client = OpenAiClient::new(&format!("http://127.0.0.1:{port}/v1"), "sk-test", 2).expect("client");
        let err = client.health_check().expect_err("nothing listens on the port");
        assert_eq!(err.code, "AI_SERVICE_UNREACHABLE");
        assert!(err.retryable);
    }

    #[test]
    fn cleanup_drops_separators_and_titles() {
        assert_eq!(clean_generated_text("---\n**TITRE**\nTexte.\n"), "Texte.");
    }
}
