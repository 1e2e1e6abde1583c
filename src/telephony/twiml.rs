/// TwiML that connects the answered call to our media stream endpoint,
/// passing the scenario as a custom stream parameter
pub fn connect_stream(public_host: &str, scenario: &str) -> String {
    format!(
        concat!(
            r#"<?xml version="1.0" encoding="UTF-8"?>"#,
            r#"<Response><Connect>"#,
            r#"<Stream url="wss://{}/media-stream">"#,
            r#"<Parameter name="scenario" value="{}" />"#,
            r#"</Stream></Connect></Response>"#
        ),
        escape(public_host),
        escape(scenario)
    )
}

fn escape(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            other => escaped.push(other),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connect_stream() {
        let xml = connect_stream("probe.example.com", "reschedule");
        assert!(xml.starts_with("<?xml"));
        assert!(xml.contains(r#"<Stream url="wss://probe.example.com/media-stream">"#));
        assert!(xml.contains(r#"<Parameter name="scenario" value="reschedule" />"#));
    }

    #[test]
    fn test_scenario_is_escaped() {
        let xml = connect_stream("host", r#"a"b<c>&"#);
        assert!(xml.contains(r#"value="a&quot;b&lt;c&gt;&amp;""#));
    }
}
