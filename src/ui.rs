use html_compile::compile::build_component;
use html_compile::types::{Attribute, Child, Component};

const BASE_CSS: &str = include_str!("ui_assets/base.css");
const FRONTEND_MODULE: &str = "/assets/reko-frontend.js";

const PROVIDERS: [(&str, &str); 4] = [
    ("ollama", "Ollama"),
    ("lmstudio", "LM Studio"),
    ("openai", "OpenAI"),
    ("anthropic", "Anthropic"),
];
const LENGTHS: [(&str, &str); 3] = [("short", "Short"), ("medium", "Medium"), ("long", "Long")];

/// Values the form starts with before any saved settings are restored.
#[derive(Debug, Clone)]
pub struct FormDefaults {
    pub provider: &'static str,
    pub target_language: &'static str,
    pub length: &'static str,
    pub temperature: f64,
    pub target_chunk_words: i64,
    pub max_tokens: i64,
    pub max_retries: i64,
    pub think: bool,
    pub include_summary: bool,
    pub include_key_points: bool,
}

impl Default for FormDefaults {
    fn default() -> Self {
        Self {
            provider: "ollama",
            target_language: "en",
            length: "medium",
            temperature: 1.0,
            target_chunk_words: 800,
            max_tokens: 16384,
            max_retries: 3,
            think: false,
            include_summary: true,
            include_key_points: true,
        }
    }
}

#[derive(Debug, Clone)]
struct UiElement {
    tag: &'static str,
    attrs: Vec<(&'static str, String)>,
    content: UiContent,
}

#[derive(Debug, Clone)]
enum UiContent {
    Empty,
    Text(String),
    Children(Vec<UiElement>),
}

impl UiElement {
    fn new(tag: &'static str) -> Self {
        Self {
            tag,
            attrs: Vec::new(),
            content: UiContent::Empty,
        }
    }

    fn with_attr(mut self, label: &'static str, value: impl Into<String>) -> Self {
        self.attrs.push((label, value.into()));
        self
    }

    fn maybe_attr(
        mut self,
        condition: bool,
        label: &'static str,
        value: impl Into<String>,
    ) -> Self {
        if condition {
            self.attrs.push((label, value.into()));
        }
        self
    }

    /// Text is emitted as given; escape untrusted values before passing them in.
    fn with_text(mut self, text: impl Into<String>) -> Self {
        self.content = UiContent::Text(text.into());
        self
    }

    fn with_children(mut self, children: Vec<UiElement>) -> Self {
        self.content = UiContent::Children(children);
        self
    }

    fn render(&self) -> String {
        build_component(&self.to_component())
    }

    fn to_component<'a>(&'a self) -> Component<'a> {
        let meta = if self.attrs.is_empty() {
            None
        } else {
            Some(
                self.attrs
                    .iter()
                    .map(|(label, value)| Attribute {
                        label,
                        value: value.as_str(),
                    })
                    .collect(),
            )
        };

        let child = match &self.content {
            UiContent::Empty => Child::NoChild,
            UiContent::Text(value) => Child::Text(value.as_str()),
            UiContent::Children(nodes) => Child::ComponentVec(
                nodes
                    .iter()
                    .map(|node| Box::new(node.to_component()))
                    .collect(),
            ),
        };

        Component {
            tag: self.tag,
            meta,
            child,
        }
    }
}

fn el(tag: &'static str) -> UiElement {
    UiElement::new(tag)
}

fn text_el(tag: &'static str, text: impl Into<String>) -> UiElement {
    UiElement::new(tag).with_text(text)
}

fn option(value: &str, label: &str, selected: bool) -> UiElement {
    el("option")
        .with_attr("value", value)
        .maybe_attr(selected, "selected", "selected")
        .with_text(label)
}

fn select(id: &str, choices: &[(&str, &str)], selected: &str) -> UiElement {
    el("select").with_attr("id", id).with_attr("name", id).with_children(
        choices
            .iter()
            .map(|(value, label)| option(value, label, *value == selected))
            .collect(),
    )
}

fn input_base(input_type: &str, id: &str, value: &str) -> UiElement {
    el("input")
        .with_attr("type", input_type)
        .with_attr("name", id)
        .with_attr("id", id)
        .with_attr("value", escape_html(value))
}

fn number_input(id: &str, value: impl ToString, min: &str, step: &str) -> UiElement {
    input_base("number", id, &value.to_string())
        .with_attr("min", min)
        .with_attr("step", step)
}

fn checkbox(id: &str, checked: bool) -> UiElement {
    el("input")
        .with_attr("type", "checkbox")
        .with_attr("name", id)
        .with_attr("id", id)
        .maybe_attr(checked, "checked", "checked")
}

fn form_group(id: &str, label: &str, control: UiElement) -> UiElement {
    el("div")
        .with_attr("class", "form-group")
        .with_children(vec![text_el("label", label).with_attr("for", id), control])
}

fn toggle_group(id: &str, label: &str, checked: bool) -> UiElement {
    el("div")
        .with_attr("class", "form-group inline")
        .with_children(vec![
            checkbox(id, checked),
            text_el("label", label).with_attr("for", id),
        ])
}

fn stat(id: &str, label: &str) -> UiElement {
    el("span").with_children(vec![
        text_el("span", format!("{label} ")),
        text_el("strong", "-").with_attr("id", id),
    ])
}

fn render_settings_form(defaults: &FormDefaults) -> UiElement {
    el("form")
        .with_attr("id", "settings-form")
        .with_attr("class", "card")
        .with_attr("autocomplete", "off")
        .with_attr("novalidate", "novalidate")
        .with_children(vec![
            text_el("h2", "Video"),
            form_group(
                "url",
                "Video URL",
                input_base("url", "url", "")
                    .with_attr("placeholder", "https://www.youtube.com/watch?v=..."),
            ),
            text_el("h2", "Model"),
            form_group(
                "provider",
                "Provider",
                select("provider", &PROVIDERS, defaults.provider),
            ),
            form_group(
                "model-name",
                "Model name",
                input_base("text", "model-name", "").with_attr("placeholder", "llama3.2:3b"),
            ),
            form_group(
                "host",
                "Host (optional)",
                input_base("text", "host", "").with_attr("placeholder", "http://localhost:11434"),
            ),
            text_el("h2", "Output"),
            form_group(
                "target-language",
                "Target language",
                input_base("text", "target-language", defaults.target_language)
                    .with_attr("maxlength", "3"),
            ),
            form_group(
                "length",
                "Length",
                select("length", &LENGTHS, defaults.length),
            ),
            toggle_group("include-summary", "Include summary", defaults.include_summary),
            toggle_group(
                "include-key-points",
                "Include key points",
                defaults.include_key_points,
            ),
            text_el("h2", "Advanced"),
            form_group(
                "temperature",
                "Temperature",
                number_input("temperature", defaults.temperature, "0", "0.1"),
            ),
            form_group(
                "target-chunk-words",
                "Target chunk words",
                number_input("target-chunk-words", defaults.target_chunk_words, "1", "1"),
            ),
            form_group(
                "max-tokens",
                "Max tokens",
                number_input("max-tokens", defaults.max_tokens, "1", "1"),
            ),
            form_group(
                "max-retries",
                "Max retries",
                number_input("max-retries", defaults.max_retries, "0", "1"),
            ),
            toggle_group("think", "Enable thinking", defaults.think),
        ])
}

fn render_result_panel() -> UiElement {
    el("section").with_attr("class", "card").with_children(vec![
        el("div").with_attr("class", "toolbar").with_children(vec![
            text_el("button", "Summarize")
                .with_attr("type", "button")
                .with_attr("id", "summarize-btn")
                .with_attr("class", "btn"),
            text_el("button", "Copy")
                .with_attr("type", "button")
                .with_attr("id", "copy-btn")
                .with_attr("class", "btn secondary"),
            text_el("button", "Download")
                .with_attr("type", "button")
                .with_attr("id", "download-btn")
                .with_attr("class", "btn secondary"),
            text_el("span", "Ready").with_attr("id", "status"),
        ]),
        el("div").with_attr("class", "stats").with_children(vec![
            stat("stat-input-words", "Input words"),
            stat("stat-output-words", "Output words"),
            stat("stat-elapsed", "Elapsed"),
        ]),
        el("div").with_attr("id", "preview").with_children(vec![
            text_el("p", "The summary will appear here.").with_attr("class", "placeholder"),
        ]),
    ])
}

pub fn render_index_page(defaults: &FormDefaults) -> String {
    let content = vec![
        el("div").with_children(vec![
            text_el("h1", "Reko"),
            render_settings_form(defaults),
        ]),
        render_result_panel(),
    ];

    render_document("Reko - Video Summarizer", content)
}

fn render_document(title: &str, content: Vec<UiElement>) -> String {
    let head_children = vec![
        el("meta").with_attr("charset", "UTF-8"),
        el("meta")
            .with_attr("name", "viewport")
            .with_attr("content", "width=device-width, initial-scale=1.0"),
        text_el("title", escape_html(title)),
        el("style").with_text(BASE_CSS),
    ];

    let body_children = vec![
        el("main").with_children(content),
        el("script")
            .with_attr("type", "module")
            .with_text(frontend_bootstrap()),
    ];

    let html = el("html").with_attr("lang", "en").with_children(vec![
        el("head").with_children(head_children),
        el("body").with_children(body_children),
    ]);

    format!("<!DOCTYPE html>\n{}", html.render())
}

fn frontend_bootstrap() -> String {
    format!(
        "import init from \"{FRONTEND_MODULE}\";\n\
         init().catch((err) => console.error(\"reko frontend failed to start\", err));\n"
    )
}

fn escape_html(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}
