//! Small utility helpers used across modules.

/// Very small and safe string templating.
/// Replaces occurrences of `{key}` in the template with provided values.
/// This is intentionally simple (no nested/conditional logic).
pub fn fill_template(tpl: &str, pairs: &[(&str, &str)]) -> String {
  let mut out = tpl.to_string();
  for (k, v) in pairs {
    let needle = format!("{{{}}}", k);
    out = out.replace(&needle, v);
  }
  out
}

/// Strip an optional markdown code-fence wrapper from a model response.
/// Handles both ```json and bare ``` fences; anything else passes through.
pub fn strip_code_fences(s: &str) -> &str {
  let mut t = s.trim();
  if let Some(rest) = t.strip_prefix("```json") {
    t = rest.trim_start();
  } else if let Some(rest) = t.strip_prefix("```") {
    t = rest.trim_start();
  }
  if let Some(rest) = t.strip_suffix("```") {
    t = rest.trim_end();
  }
  t
}

/// Log-safe truncation for large strings.
/// Avoids spamming logs with huge request/response payloads.
pub fn trunc_for_log(s: &str, max: usize) -> String {
  if s.len() <= max {
    s.to_string()
  } else {
    let mut cut = max;
    while !s.is_char_boundary(cut) {
      cut -= 1;
    }
    format!("{}… ({} bytes total)", &s[..cut], s.len())
  }
}
