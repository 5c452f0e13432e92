use cctp_ai::draft::system_prompt::SystemPromptStore;
use cctp_ai::draft::{
    draft_section_with_llm, improve_system_prompt, DraftAction, SectionDraftRequest, DEFAULT_SYSTEM_PROMPT,
};
use cctp_ai::llm::openai_llm::OpenAiLlm;
use cctp_ai::openai::OpenAiClient;
use clap::{Args, Subcommand, ValueEnum};
use serde::Serialize;

use super::knowledge::knowledge_store;
use super::{print_json, read_input};
use crate::config::Config;

fn client_from_config(config: &Config) -> color_eyre::Result<OpenAiClient> {
    Ok(OpenAiClient::new(
        &config.llm.base_url,
        config.llm.api_key.as_deref().unwrap_or_default(),
        config.llm.timeout_secs,
    )?)
}

fn llm_from_config(config: &Config) -> color_eyre::Result<OpenAiLlm> {
    Ok(OpenAiLlm::new(client_from_config(config)?))
}

#[derive(Debug, Serialize)]
struct AiHealthStatus {
    ok: bool,
    message: String,
}

pub fn run_doctor(config: &Config) -> color_eyre::Result<()> {
    let client = client_from_config(config)?;
    client.health_check()?;
    print_json(&AiHealthStatus {
        ok: true,
        message: format!("Text generation service reachable at {}", client.base_url()),
    })
}

fn prompt_store(config: &Config) -> SystemPromptStore {
    SystemPromptStore::open(&config.data_dir)
}

#[derive(Clone, Copy, ValueEnum)]
enum ActionArg {
    Generate,
    Correct,
    Lengthen,
    Shorten,
}

impl From<ActionArg> for DraftAction {
    fn from(value: ActionArg) -> Self {
        match value {
            ActionArg::Generate => DraftAction::Generate,
            ActionArg::Correct => DraftAction::Correct,
            ActionArg::Lengthen => DraftAction::Lengthen,
            ActionArg::Shorten => DraftAction::Shorten,
        }
    }
}

#[derive(Args)]
pub struct GenerateCommand {
    /// Group (typology) the section belongs to
    #[arg(long)]
    group: String,

    /// Section title
    #[arg(long)]
    section: String,

    #[arg(long, value_enum, default_value = "generate")]
    action: ActionArg,

    /// User notes for the section
    #[arg(long, default_value = "")]
    notes: String,

    /// File holding the current text, required by correct/lengthen/shorten (`-` for stdin)
    #[arg(long)]
    current_text: Option<String>,

    /// Titles of the sibling sections, for context
    #[arg(long, default_value = "")]
    context: String,

    /// Extra instruction for this section only
    #[arg(long)]
    instruction: Option<String>,
}

impl GenerateCommand {
    pub fn run(self, config: &Config) -> color_eyre::Result<()> {
        let llm = llm_from_config(config)?;
        let system_prompt = prompt_store(config).load()?;
        let knowledge = knowledge_store(config).load_raw()?;
        let current_text = match self.current_text.as_deref() {
            Some(path) => read_input(path)?,
            None => String::new(),
        };

        let response = draft_section_with_llm(
            &llm,
            knowledge.as_ref(),
            &system_prompt,
            &config.draft_settings(),
            SectionDraftRequest {
                group_name: self.group,
                section_title: self.section,
                notes: self.notes,
                current_text,
                context_summary: self.context,
                custom_instruction: self.instruction,
                action: self.action.into(),
            },
        )?;
        print_json(&response)
    }
}

#[derive(Subcommand)]
pub enum PromptCommand {
    /// Print the system prompt in use
    Show,

    /// Replace the system prompt with the contents of a file (`-` for stdin)
    Set { file: String },

    /// Ask the generator to fold a request into the default prompt
    Improve {
        request: String,

        /// Store the result as the system prompt
        #[arg(long)]
        save: bool,
    },

    /// Go back to the built-in prompt
    Reset,
}

#[derive(Debug, Serialize)]
struct PromptView {
    custom: bool,
    prompt: String,
}

impl PromptCommand {
    pub fn run(self, config: &Config) -> color_eyre::Result<()> {
        let store = prompt_store(config);
        match self {
            PromptCommand::Show => {}
            PromptCommand::Set { file } => store.save(&read_input(&file)?)?,
            PromptCommand::Improve { request, save } => {
                let llm = llm_from_config(config)?;
                let improved = improve_system_prompt(
                    &llm,
                    &config.llm.generation_model,
                    config.llm.temperature,
                    DEFAULT_SYSTEM_PROMPT,
                    &request,
                )?;
                if !save {
                    return print_json(&PromptView {
                        custom: false,
                        prompt: improved,
                    });
                }
                store.save(&improved)?;
            }
            PromptCommand::Reset => store.reset()?,
        }
        print_json(&PromptView {
            custom: store.is_custom()?,
            prompt: store.load()?,
        })
    }
}
