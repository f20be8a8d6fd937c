use serde::Serialize;

use todobot_core::domain::todo::{Todo, TodoId};

pub const CREATE_TODO_CALLBACK_ID: &str = "create_todo_modal";
pub const TODO_INFOS_BLOCK_ID: &str = "todo_infos";
pub const TODO_NAME_ACTION_ID: &str = "name_todo";
pub const VIEW_TODOS_ACTION_ID: &str = "VIEW_TODOS";
pub const SELECTED_TODO_ACTION_ID: &str = "SELECTED_TODO";
pub const DELETE_TODO_ACTION_ID: &str = "DELETE_TODO";

/// Slack rejects a static select carrying more options than this.
pub const MAX_SELECT_OPTIONS: usize = 100;
/// Slack rejects option labels longer than this.
pub const MAX_OPTION_LABEL_CHARS: usize = 75;
/// Shown for todos whose name is blank; Slack rejects empty option text.
pub const UNTITLED_TODO_LABEL: &str = "(untitled)";

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type")]
pub enum TextObject {
    #[serde(rename = "plain_text")]
    Plain { text: String, emoji: bool },
}

impl TextObject {
    pub fn plain(text: impl Into<String>) -> Self {
        Self::Plain { text: text.into(), emoji: true }
    }

    pub fn text(&self) -> &str {
        match self {
            Self::Plain { text, .. } => text,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ButtonStyle {
    Danger,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ButtonElement {
    pub action_id: String,
    pub text: TextObject,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<ButtonStyle>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

impl ButtonElement {
    pub fn new(action_id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            action_id: action_id.into(),
            text: TextObject::plain(label),
            style: None,
            value: None,
        }
    }

    pub fn style(mut self, style: ButtonStyle) -> Self {
        self.style = Some(style);
        self
    }

    pub fn value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct OptionObject {
    pub text: TextObject,
    pub value: String,
}

impl OptionObject {
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self { text: TextObject::plain(label), value: value.into() }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct StaticSelectElement {
    pub action_id: String,
    pub placeholder: TextObject,
    pub options: Vec<OptionObject>,
}

impl StaticSelectElement {
    pub fn new(action_id: impl Into<String>, placeholder: impl Into<String>) -> Self {
        Self {
            action_id: action_id.into(),
            placeholder: TextObject::plain(placeholder),
            options: Vec::new(),
        }
    }

    pub fn options<I>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = OptionObject>,
    {
        self.options.extend(options);
        self
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PlainTextInputElement {
    pub action_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<TextObject>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ActionElement {
    Button(ButtonElement),
    StaticSelect(StaticSelectElement),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InputElement {
    PlainTextInput(PlainTextInputElement),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Block {
    Section {
        block_id: String,
        text: TextObject,
    },
    Actions {
        block_id: String,
        elements: Vec<ActionElement>,
    },
    Input {
        block_id: String,
        label: TextObject,
        element: InputElement,
        #[serde(skip_serializing_if = "Option::is_none")]
        hint: Option<TextObject>,
    },
}

/// Message payload accepted by `chat.postEphemeral` and by `response_url`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MessageTemplate {
    #[serde(rename = "text")]
    pub fallback_text: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub blocks: Vec<Block>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub replace_original: Option<bool>,
}

impl MessageTemplate {
    pub fn buttons(&self) -> impl Iterator<Item = &ButtonElement> {
        self.action_elements().filter_map(|element| match element {
            ActionElement::Button(button) => Some(button),
            ActionElement::StaticSelect(_) => None,
        })
    }

    pub fn static_select(&self, action_id: &str) -> Option<&StaticSelectElement> {
        self.action_elements().find_map(|element| match element {
            ActionElement::StaticSelect(select) if select.action_id == action_id => Some(select),
            _ => None,
        })
    }

    fn action_elements(&self) -> impl Iterator<Item = &ActionElement> {
        self.blocks
            .iter()
            .filter_map(|block| match block {
                Block::Actions { elements, .. } => Some(elements),
                _ => None,
            })
            .flatten()
    }
}

pub struct MessageBuilder {
    fallback_text: String,
    blocks: Vec<Block>,
    replace_original: Option<bool>,
}

impl MessageBuilder {
    pub fn new(fallback_text: impl Into<String>) -> Self {
        Self { fallback_text: fallback_text.into(), blocks: Vec::new(), replace_original: None }
    }

    pub fn section(mut self, block_id: impl Into<String>, text: TextObject) -> Self {
        self.blocks.push(Block::Section { block_id: block_id.into(), text });
        self
    }

    pub fn actions<F>(mut self, block_id: impl Into<String>, build: F) -> Self
    where
        F: FnOnce(&mut ActionsBuilder),
    {
        let mut builder = ActionsBuilder::default();
        build(&mut builder);
        self.blocks.push(Block::Actions { block_id: block_id.into(), elements: builder.build() });
        self
    }

    pub fn replace_original(mut self, replace: bool) -> Self {
        self.replace_original = Some(replace);
        self
    }

    pub fn build(self) -> MessageTemplate {
        MessageTemplate {
            fallback_text: self.fallback_text,
            blocks: self.blocks,
            replace_original: self.replace_original,
        }
    }
}

#[derive(Default)]
pub struct ActionsBuilder {
    elements: Vec<ActionElement>,
}

impl ActionsBuilder {
    pub fn button(&mut self, button: ButtonElement) -> &mut Self {
        self.elements.push(ActionElement::Button(button));
        self
    }

    pub fn static_select(&mut self, select: StaticSelectElement) -> &mut Self {
        self.elements.push(ActionElement::StaticSelect(select));
        self
    }

    fn build(self) -> Vec<ActionElement> {
        self.elements
    }
}

/// Modal payload for `views.open`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename = "modal")]
pub struct ModalView {
    pub callback_id: String,
    pub title: TextObject,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submit: Option<TextObject>,
    pub blocks: Vec<Block>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub private_metadata: Option<String>,
}

pub struct ModalBuilder {
    view: ModalView,
}

impl ModalBuilder {
    pub fn new(callback_id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            view: ModalView {
                callback_id: callback_id.into(),
                title: TextObject::plain(title),
                submit: None,
                blocks: Vec::new(),
                private_metadata: None,
            },
        }
    }

    pub fn submit(mut self, label: impl Into<String>) -> Self {
        self.view.submit = Some(TextObject::plain(label));
        self
    }

    pub fn private_metadata(mut self, metadata: impl Into<String>) -> Self {
        self.view.private_metadata = Some(metadata.into());
        self
    }

    pub fn text_input(
        mut self,
        block_id: impl Into<String>,
        action_id: impl Into<String>,
        label: impl Into<String>,
        placeholder: Option<&str>,
        hint: Option<&str>,
    ) -> Self {
        self.view.blocks.push(Block::Input {
            block_id: block_id.into(),
            label: TextObject::plain(label),
            element: InputElement::PlainTextInput(PlainTextInputElement {
                action_id: action_id.into(),
                placeholder: placeholder.map(TextObject::plain),
            }),
            hint: hint.map(TextObject::plain),
        });
        self
    }

    pub fn build(self) -> ModalView {
        self.view
    }
}

pub fn create_todo_modal(channel_id: &str) -> ModalView {
    ModalBuilder::new(CREATE_TODO_CALLBACK_ID, "Create a todo")
        .submit("Create")
        .private_metadata(channel_id)
        .text_input(
            TODO_INFOS_BLOCK_ID,
            TODO_NAME_ACTION_ID,
            "Todo name",
            Some("Do the groceries"),
            Some("Describe the name of the todo"),
        )
        .build()
}

pub fn todo_created_message() -> MessageTemplate {
    MessageBuilder::new(":white_check_mark: The todo was added to the list.").build()
}

pub fn dashboard_message() -> MessageTemplate {
    MessageBuilder::new("Welcome to the todo dashboard")
        .actions("todo_dashboard", |actions| {
            actions.button(
                ButtonElement::new(VIEW_TODOS_ACTION_ID, ":page_facing_up: View todos")
                    .value("view_todos"),
            );
        })
        .build()
}

pub fn todo_list_message(todos: &[Todo]) -> MessageTemplate {
    if todos.is_empty() {
        return MessageBuilder::new("No todos yet")
            .section(
                "todo_list_empty",
                TextObject::plain("There are no todos yet. Use /create to add one."),
            )
            .build();
    }

    let options = todos
        .iter()
        .take(MAX_SELECT_OPTIONS)
        .map(|todo| OptionObject::new(option_label(&todo.name), todo.id.as_str()));

    MessageBuilder::new("Todo list")
        .actions("select_todo", |actions| {
            actions.static_select(
                StaticSelectElement::new(SELECTED_TODO_ACTION_ID, "Select a todo")
                    .options(options),
            );
        })
        .build()
}

pub fn delete_confirmation_message(todo_id: &TodoId) -> MessageTemplate {
    MessageBuilder::new("Delete a todo")
        .actions("delete_todo", |actions| {
            actions.button(
                ButtonElement::new(DELETE_TODO_ACTION_ID, ":wastebasket: Delete the todo")
                    .style(ButtonStyle::Danger)
                    .value(todo_id.as_str()),
            );
        })
        .replace_original(false)
        .build()
}

pub fn todo_deleted_message() -> MessageTemplate {
    MessageBuilder::new(":white_check_mark: The todo was deleted.").build()
}

fn option_label(name: &str) -> String {
    if name.trim().is_empty() {
        return UNTITLED_TODO_LABEL.to_owned();
    }
    if name.chars().count() <= MAX_OPTION_LABEL_CHARS {
        return name.to_owned();
    }

    let mut label: String = name.chars().take(MAX_OPTION_LABEL_CHARS - 1).collect();
    label.push('…');
    label
}
