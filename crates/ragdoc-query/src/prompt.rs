//! Prompt templates rendered with minijinja.
//!
//! Variables are written `{{ name }}`. Rendering is strict: every variable
//! the template uses must be given a value.

use minijinja::{Environment, UndefinedBehavior};
use ragdoc_core::Error;
use std::collections::BTreeMap;

/// Instructions that open the question-answering prompt.
const RAG_INSTRUCTIONS: &str = concat!(
    "<s>[INST]Eres un asistente para tareas de responder preguntas. ",
    "Utiliza las siguientes piezas de contexto \n",
    "recuperado para responder la pregunta. Si no sabes la respuesta, ",
    "simplemente di que no la sabes. \n",
    "Usa un máximo de tres oraciones y mantén la respuesta concisa.[/INST]</s>\n",
    "[INST] Question: ",
);
const RAG_CONTEXT_LABEL: &str = "\nContext: ";
const RAG_ANSWER_LABEL: &str = "\nAnswer: [/INST]";

fn environment() -> Environment<'static> {
    let mut env = Environment::new();
    env.set_undefined_behavior(UndefinedBehavior::Strict);
    env.set_keep_trailing_newline(true);
    env
}

/// A checked prompt template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    template: String,
    input_variables: Vec<String>,
}

impl PromptTemplate {
    /// Check a template's syntax and record the variables it reads.
    pub fn from_template(template: &str) -> Result<Self, Error> {
        let env = environment();
        let compiled = env
            .template_from_str(template)
            .map_err(|e| Error::Config(format!("invalid prompt template: {e}")))?;

        let mut input_variables: Vec<String> =
            compiled.undeclared_variables(false).into_iter().collect();
        input_variables.sort();

        Ok(Self {
            template: template.to_string(),
            input_variables,
        })
    }

    /// The fixed retrieval-augmented answering prompt, with `question` and
    /// `context` variables.
    #[must_use]
    pub fn rag_default() -> Self {
        Self {
            template: format!(
                "{RAG_INSTRUCTIONS}{{{{ question }}}}{RAG_CONTEXT_LABEL}{{{{ context }}}}{RAG_ANSWER_LABEL}"
            ),
            input_variables: vec!["context".to_string(), "question".to_string()],
        }
    }

    /// The raw template text.
    #[must_use]
    pub fn template(&self) -> &str {
        &self.template
    }

    /// Variable names, sorted.
    #[must_use]
    pub fn input_variables(&self) -> &[String] {
        &self.input_variables
    }

    /// Render with the given values. Values for names the template does not
    /// use are ignored.
    pub fn format(&self, values: &[(&str, &str)]) -> Result<String, Error> {
        let context: BTreeMap<&str, &str> = values.iter().copied().collect();

        if let Some(missing) = self
            .input_variables
            .iter()
            .find(|name| !context.contains_key(name.as_str()))
        {
            return Err(Error::Other(format!(
                "missing value for prompt variable '{missing}'"
            )));
        }

        let env = environment();
        let template = env
            .template_from_str(&self.template)
            .map_err(|e| Error::Config(format!("invalid prompt template: {e}")))?;
        template
            .render(&context)
            .map_err(|e| Error::Other(format!("failed to render prompt: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_template_records_variables() {
        let template =
            PromptTemplate::from_template("Q: {{ question }} C: {{ context }} again {{ question }}")
                .unwrap();
        assert_eq!(template.input_variables(), &["context", "question"]);
    }

    #[test]
    fn test_format_substitutes_values() {
        let template = PromptTemplate::from_template("Hello {{ name }}, you are {{ age }}.").unwrap();
        let output = template
            .format(&[("age", "30"), ("name", "Ada"), ("unused", "x")])
            .unwrap();
        assert_eq!(output, "Hello Ada, you are 30.");
    }

    #[test]
    fn test_format_missing_variable_fails() {
        let template = PromptTemplate::from_template("{{ question }} / {{ context }}").unwrap();
        let result = template.format(&[("question", "why?")]);
        assert!(matches!(result, Err(Error::Other(msg)) if msg.contains("context")));
    }

    #[test]
    fn test_raw_block_is_literal() {
        let template =
            PromptTemplate::from_template("{% raw %}{{ q }}{% endraw %} = {{ q }}").unwrap();
        assert_eq!(template.input_variables(), &["q"]);
        assert_eq!(template.format(&[("q", "x")]).unwrap(), "{{ q }} = x");
    }

    #[test]
    fn test_malformed_templates_fail() {
        assert!(matches!(
            PromptTemplate::from_template("open {{ question"),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            PromptTemplate::from_template("empty {{ }}"),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            PromptTemplate::from_template("{% if question %}never closed"),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_format_values_are_not_reinterpreted() {
        let template = PromptTemplate::from_template("Context: {{ context }}").unwrap();
        let output = template
            .format(&[("context", "{{ question }} {% if x %}")])
            .unwrap();
        assert_eq!(output, "Context: {{ question }} {% if x %}");
    }

    #[test]
    fn test_trailing_newline_is_kept() {
        let template = PromptTemplate::from_template("{{ a }}\n").unwrap();
        assert_eq!(template.format(&[("a", "x")]).unwrap(), "x\n");
    }

    #[test]
    fn test_rag_default_matches_parsed_template() {
        let fixed = PromptTemplate::rag_default();
        let parsed = PromptTemplate::from_template(fixed.template()).unwrap();

        assert_eq!(fixed, parsed);
        let values = [("question", "What color is the sky?"), ("context", "The sky is blue.")];
        assert_eq!(
            fixed.format(&values).unwrap(),
            parsed.format(&values).unwrap()
        );
    }

    #[test]
    fn test_rag_default_output_is_exact() {
        let output = PromptTemplate::rag_default()
            .format(&[("question", "Q?"), ("context", "C.")])
            .unwrap();

        assert_eq!(
            output,
            "<s>[INST]Eres un asistente para tareas de responder preguntas. \
             Utiliza las siguientes piezas de contexto \n\
             recuperado para responder la pregunta. Si no sabes la respuesta, \
             simplemente di que no la sabes. \n\
             Usa un máximo de tres oraciones y mantén la respuesta concisa.[/INST]</s>\n\
             [INST] Question: Q?\nContext: C.\nAnswer: [/INST]"
        );
    }

    #[test]
    fn test_rag_default_layout() {
        let output = PromptTemplate::rag_default()
            .format(&[("question", "What color is the sky?"), ("context", "")])
            .unwrap();

        assert!(output.starts_with("<s>[INST]Eres un asistente"));
        assert!(output.contains("mantén la respuesta concisa.[/INST]</s>\n"));
        assert!(output.contains("[INST] Question: What color is the sky?\nContext: \nAnswer: [/INST]"));
        assert!(output.ends_with("Answer: [/INST]"));
    }
}
