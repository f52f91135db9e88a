mod perplexity;

pub use perplexity::PerplexityLlm;

/// One round of chat completion.
#[derive(Debug, Clone)]
pub struct Prompt {
    pub system: String,
    pub user: String,
    pub temperature: f64,
}

/// Hosted text-generation service.
pub trait Llm {
    fn complete(&self, prompt: &Prompt) -> anyhow::Result<String>;
}

impl<L: Llm + ?Sized> Llm for &L {
    fn complete(&self, prompt: &Prompt) -> anyhow::Result<String> {
        (**self).complete(prompt)
    }
}

impl<L: Llm + ?Sized> Llm for Box<L> {
    fn complete(&self, prompt: &Prompt) -> anyhow::Result<String> {
        (**self).complete(prompt)
    }
}

/// Models often wrap JSON in markdown fences despite being told not to.
pub fn strip_fences(content: &str) -> &str {
    let t = content.trim();
    let t = t
        .strip_prefix("```json")
        .or_else(|| t.strip_prefix("```"))
        .unwrap_or(t);
    let t = t.strip_suffix("```").unwrap_or(t);
    t.trim()
}

#[cfg(test)]
mod tests {
    use super::strip_fences;

    #[test]
    fn strips_json_fences() {
        assert_eq!(strip_fences("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_fences("```\n[]\n```  "), "[]");
        assert_eq!(strip_fences("  {}  "), "{}");
    }
}
