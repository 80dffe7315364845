use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use roxmltree::{Document, Node};

use crate::app::{Aabb, Vec3};

use super::database::TownDefs;
use super::discovery::collect_xml_files_sorted;
use super::types::{
    ChallengeDef, DialogueDef, DoorDef, NpcDef, NpcTier, ObjectDef, ReplyRule, StepDef,
    StepTrigger,
};

const DEFAULT_NPC_SPEED: f32 = 0.03;
const DEFAULT_NEAR_RADIUS: f32 = 3.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceLocation {
    pub line: usize,
    pub column: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentErrorCode {
    ReadFile,
    XmlMalformed,
    InvalidRoot,
    UnknownDefType,
    UnknownField,
    DuplicateField,
    MissingField,
    InvalidValue,
    DuplicateId,
    UnknownReference,
}

#[derive(Debug, Clone)]
pub struct ContentCompileError {
    pub code: ContentErrorCode,
    pub message: String,
    pub file_path: PathBuf,
    pub location: Option<SourceLocation>,
}

impl fmt::Display for ContentCompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.location {
            Some(loc) => write!(
                f,
                "{:?}: {} (file={}, line={}, column={})",
                self.code,
                self.message,
                self.file_path.display(),
                loc.line,
                loc.column
            ),
            None => write!(
                f,
                "{:?}: {} (file={})",
                self.code,
                self.message,
                self.file_path.display()
            ),
        }
    }
}

impl std::error::Error for ContentCompileError {}

/// One XML document and the path it is reported under.
#[derive(Debug, Clone)]
pub struct ContentSource {
    pub path: PathBuf,
    pub text: String,
}

impl ContentSource {
    pub fn new(path: impl Into<PathBuf>, text: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            text: text.into(),
        }
    }
}

/// Reads and compiles every `.xml` file under `content_dir`.
pub fn compile_town_defs(content_dir: &Path) -> Result<TownDefs, ContentCompileError> {
    let files = collect_xml_files_sorted(content_dir)
        .map_err(|error| read_error(error.path, error.source))?;
    let mut sources = Vec::with_capacity(files.len());
    for path in files {
        let text = fs::read_to_string(&path).map_err(|source| read_error(path.clone(), source))?;
        sources.push(ContentSource { path, text });
    }
    compile_sources(&sources)
}

/// Compiles in-memory documents in the given order; ids are global across
/// all documents.
pub fn compile_sources(sources: &[ContentSource]) -> Result<TownDefs, ContentCompileError> {
    let mut pending = PendingDefs::default();
    for source in sources {
        parse_defs_document(&source.path, &source.text, &mut pending)?;
    }
    pending.resolve()
}

#[derive(Debug, Clone)]
struct Origin {
    file_path: PathBuf,
    location: Option<SourceLocation>,
}

impl Origin {
    fn error(&self, code: ContentErrorCode, message: String) -> ContentCompileError {
        ContentCompileError {
            code,
            message,
            file_path: self.file_path.clone(),
            location: self.location,
        }
    }
}

#[derive(Debug, Default)]
struct PendingDefs {
    objects: Vec<ObjectDef>,
    npcs: Vec<(NpcDef, Origin)>,
    dialogues: Vec<DialogueDef>,
    challenges: Vec<(ChallengeDef, Vec<Origin>)>,
    seen_ids: HashSet<(&'static str, String)>,
}

impl PendingDefs {
    fn resolve(self) -> Result<TownDefs, ContentCompileError> {
        let dialogue_ids = self
            .dialogues
            .iter()
            .map(|dialogue| dialogue.id.as_str())
            .collect::<HashSet<_>>();
        for (npc, origin) in &self.npcs {
            if !dialogue_ids.contains(npc.dialogue.as_str()) {
                return Err(origin.error(
                    ContentErrorCode::UnknownReference,
                    format!(
                        "NpcDef '{}' references unknown DialogueDef '{}'",
                        npc.id, npc.dialogue
                    ),
                ));
            }
        }

        let mut background = self
            .npcs
            .iter()
            .filter(|(npc, _)| npc.tier == NpcTier::Background);
        if let Some((first, _)) = background.next() {
            if let Some((npc, origin)) =
                background.find(|(npc, _)| npc.dialogue != first.dialogue)
            {
                return Err(origin.error(
                    ContentErrorCode::InvalidValue,
                    format!(
                        "background NpcDef '{}' uses DialogueDef '{}' but background NPCs share '{}'",
                        npc.id, npc.dialogue, first.dialogue
                    ),
                ));
            }
        }

        let npc_names = self
            .npcs
            .iter()
            .map(|(npc, _)| npc.name.as_str())
            .collect::<HashSet<_>>();
        for (challenge, step_origins) in &self.challenges {
            for (step, origin) in challenge.steps.iter().zip(step_origins) {
                match &step.trigger {
                    StepTrigger::Talk { npc } if !npc_names.contains(npc.as_str()) => {
                        return Err(origin.error(
                            ContentErrorCode::UnknownReference,
                            format!(
                                "challenge '{}' step talks to unknown NPC '{}'",
                                challenge.id, npc
                            ),
                        ));
                    }
                    StepTrigger::Near { tag, .. }
                        if !self.objects.iter().any(|object| object.has_tag(tag)) =>
                    {
                        return Err(origin.error(
                            ContentErrorCode::UnknownReference,
                            format!(
                                "challenge '{}' step is near tag '{}' which no ObjectDef carries",
                                challenge.id, tag
                            ),
                        ));
                    }
                    _ => {}
                }
            }
        }

        Ok(TownDefs::new(
            self.objects,
            self.npcs.into_iter().map(|(npc, _)| npc).collect(),
            self.dialogues,
            self.challenges
                .into_iter()
                .map(|(challenge, _)| challenge)
                .collect(),
        ))
    }
}

struct DocCtx<'a, 'input> {
    file_path: &'a Path,
    doc: &'a Document<'input>,
}

impl DocCtx<'_, '_> {
    fn origin(&self, node: Node<'_, '_>) -> Origin {
        let pos = self.doc.text_pos_at(node.range().start);
        Origin {
            file_path: self.file_path.to_path_buf(),
            location: Some(SourceLocation {
                line: pos.row as usize,
                column: pos.col as usize,
            }),
        }
    }

    fn error(
        &self,
        code: ContentErrorCode,
        message: String,
        node: Node<'_, '_>,
    ) -> ContentCompileError {
        self.origin(node).error(code, message)
    }
}

fn parse_defs_document(
    file_path: &Path,
    raw: &str,
    pending: &mut PendingDefs,
) -> Result<(), ContentCompileError> {
    let doc = Document::parse(raw).map_err(|error| ContentCompileError {
        code: ContentErrorCode::XmlMalformed,
        message: format!("malformed XML: {error}"),
        file_path: file_path.to_path_buf(),
        location: Some(SourceLocation {
            line: error.pos().row as usize,
            column: error.pos().col as usize,
        }),
    })?;
    let ctx = DocCtx {
        file_path,
        doc: &doc,
    };

    let root = doc.root_element();
    if root.tag_name().name() != "Defs" {
        return Err(ctx.error(
            ContentErrorCode::InvalidRoot,
            "root element must be <Defs>".to_string(),
            root,
        ));
    }

    for child in root.children().filter(|node| node.is_element()) {
        let kind = child.tag_name().name();
        let id = required_attr(&ctx, child, kind, "id")?.to_string();
        let kind_key = match kind {
            "ObjectDef" => "ObjectDef",
            "NpcDef" => "NpcDef",
            "DialogueDef" => "DialogueDef",
            "ChallengeDef" => "ChallengeDef",
            _ => {
                return Err(ctx.error(
                    ContentErrorCode::UnknownDefType,
                    format!(
                        "unsupported def type <{kind}>; expected ObjectDef, NpcDef, DialogueDef or ChallengeDef"
                    ),
                    child,
                ))
            }
        };
        if !pending.seen_ids.insert((kind_key, id.clone())) {
            return Err(ctx.error(
                ContentErrorCode::DuplicateId,
                format!("duplicate {kind_key} id '{id}'"),
                child,
            ));
        }

        match kind_key {
            "ObjectDef" => pending.objects.push(parse_object_def(&ctx, child, id)?),
            "NpcDef" => {
                let npc = parse_npc_def(&ctx, child, id)?;
                pending.npcs.push((npc, ctx.origin(child)));
            }
            "DialogueDef" => pending.dialogues.push(parse_dialogue_def(&ctx, child, id)?),
            _ => pending.challenges.push(parse_challenge_def(&ctx, child, id)?),
        }
    }

    Ok(())
}

fn parse_object_def(
    ctx: &DocCtx<'_, '_>,
    node: Node<'_, '_>,
    id: String,
) -> Result<ObjectDef, ContentCompileError> {
    let mut label: Option<String> = None;
    let mut position: Option<Vec3> = None;
    let mut yaw = 0.0;
    let mut collider: Option<Aabb> = None;
    let mut door: Option<DoorDef> = None;
    let mut large = false;
    let mut tags = Vec::new();

    for field in def_fields(ctx, node, "ObjectDef", &[])? {
        match field.tag_name().name() {
            "label" => label = Some(required_text(ctx, field, "label")?),
            "position" => {
                let value = required_text(ctx, field, "position")?;
                position = Some(parse_vec3(ctx, field, "position", &value)?);
            }
            "yaw" => {
                let value = required_text(ctx, field, "yaw")?;
                yaw = parse_f32(ctx, field, "yaw", &value)?;
            }
            "collider" => {
                let min = parse_vec3(ctx, field, "min", required_attr(ctx, field, "collider", "min")?)?;
                let max = parse_vec3(ctx, field, "max", required_attr(ctx, field, "collider", "max")?)?;
                collider = Some(Aabb::new(min, max));
            }
            "door" => {
                let offset = parse_vec3(
                    ctx,
                    field,
                    "offset",
                    required_attr(ctx, field, "door", "offset")?,
                )?;
                let door_label = required_attr(ctx, field, "door", "label")?.to_string();
                door = Some(DoorDef {
                    offset,
                    label: door_label,
                });
            }
            "large" => {
                let value = required_text(ctx, field, "large")?;
                large = parse_bool(ctx, field, "large", &value)?;
            }
            "tags" => tags = split_list(field.text().unwrap_or_default()),
            other => return Err(unknown_field(ctx, field, other, "ObjectDef")),
        }
    }

    let label = label.ok_or_else(|| missing_field(ctx, node, "label", "ObjectDef"))?;
    let position = position.ok_or_else(|| missing_field(ctx, node, "position", "ObjectDef"))?;
    Ok(ObjectDef {
        id,
        label,
        position,
        yaw,
        collider,
        door,
        large,
        tags,
    })
}

fn parse_npc_def(
    ctx: &DocCtx<'_, '_>,
    node: Node<'_, '_>,
    id: String,
) -> Result<NpcDef, ContentCompileError> {
    let mut name: Option<String> = None;
    let mut tier: Option<NpcTier> = None;
    let mut position: Option<Vec3> = None;
    let mut wander_radius: Option<f32> = None;
    let mut speed = DEFAULT_NPC_SPEED;
    let mut scale = 1.0;
    let mut heading: Option<f32> = None;
    let mut dialogue: Option<String> = None;

    for field in def_fields(ctx, node, "NpcDef", &[])? {
        match field.tag_name().name() {
            "name" => name = Some(required_text(ctx, field, "name")?),
            "tier" => {
                let value = required_text(ctx, field, "tier")?;
                tier = Some(match value.as_str() {
                    "main" => NpcTier::Main,
                    "background" => NpcTier::Background,
                    _ => {
                        return Err(ctx.error(
                            ContentErrorCode::InvalidValue,
                            format!("invalid tier '{value}'; allowed values: main, background"),
                            field,
                        ))
                    }
                });
            }
            "position" => {
                let value = required_text(ctx, field, "position")?;
                position = Some(parse_vec3(ctx, field, "position", &value)?);
            }
            "wanderRadius" => {
                let value = required_text(ctx, field, "wanderRadius")?;
                wander_radius = Some(parse_positive(ctx, field, "wanderRadius", &value)?);
            }
            "speed" => {
                let value = required_text(ctx, field, "speed")?;
                speed = parse_f32(ctx, field, "speed", &value)?;
                if speed < 0.0 {
                    return Err(ctx.error(
                        ContentErrorCode::InvalidValue,
                        "speed must be >= 0".to_string(),
                        field,
                    ));
                }
            }
            "scale" => {
                let value = required_text(ctx, field, "scale")?;
                scale = parse_positive(ctx, field, "scale", &value)?;
            }
            "heading" => {
                let value = required_text(ctx, field, "heading")?;
                heading = Some(parse_f32(ctx, field, "heading", &value)?);
            }
            "dialogue" => dialogue = Some(required_text(ctx, field, "dialogue")?),
            other => return Err(unknown_field(ctx, field, other, "NpcDef")),
        }
    }

    let name = name.ok_or_else(|| missing_field(ctx, node, "name", "NpcDef"))?;
    let tier = tier.ok_or_else(|| missing_field(ctx, node, "tier", "NpcDef"))?;
    let position = position.ok_or_else(|| missing_field(ctx, node, "position", "NpcDef"))?;
    let dialogue = dialogue.ok_or_else(|| missing_field(ctx, node, "dialogue", "NpcDef"))?;
    if tier == NpcTier::Main && wander_radius.is_none() {
        return Err(missing_field(ctx, node, "wanderRadius", "NpcDef with tier main"));
    }

    Ok(NpcDef {
        id,
        name,
        tier,
        position,
        wander_radius,
        speed,
        scale,
        heading,
        dialogue,
    })
}

fn parse_dialogue_def(
    ctx: &DocCtx<'_, '_>,
    node: Node<'_, '_>,
    id: String,
) -> Result<DialogueDef, ContentCompileError> {
    let mut lines = Vec::new();
    let mut replies = Vec::new();
    let mut fallback: Option<String> = None;

    for field in def_fields(ctx, node, "DialogueDef", &["line", "reply"])? {
        match field.tag_name().name() {
            "line" => lines.push(required_text(ctx, field, "line")?),
            "reply" => {
                let keywords = split_list(required_attr(ctx, field, "reply", "keywords")?)
                    .into_iter()
                    .map(|keyword| keyword.to_lowercase())
                    .collect::<Vec<_>>();
                if keywords.is_empty() {
                    return Err(ctx.error(
                        ContentErrorCode::InvalidValue,
                        "reply keywords must list at least one keyword".to_string(),
                        field,
                    ));
                }
                replies.push(ReplyRule {
                    keywords,
                    response: required_text(ctx, field, "reply")?,
                });
            }
            "fallback" => fallback = Some(required_text(ctx, field, "fallback")?),
            other => return Err(unknown_field(ctx, field, other, "DialogueDef")),
        }
    }

    if lines.is_empty() {
        return Err(missing_field(ctx, node, "line", "DialogueDef"));
    }
    Ok(DialogueDef {
        id,
        lines,
        replies,
        fallback,
    })
}

fn parse_challenge_def(
    ctx: &DocCtx<'_, '_>,
    node: Node<'_, '_>,
    id: String,
) -> Result<(ChallengeDef, Vec<Origin>), ContentCompileError> {
    let title = required_attr(ctx, node, "ChallengeDef", "title")?.to_string();
    let mut description: Option<String> = None;
    let mut reward: Option<String> = None;
    let mut steps = Vec::new();
    let mut step_origins = Vec::new();

    for field in def_fields(ctx, node, "ChallengeDef", &["step"])? {
        match field.tag_name().name() {
            "description" => description = Some(required_text(ctx, field, "description")?),
            "reward" => reward = Some(required_text(ctx, field, "reward")?),
            "step" => {
                steps.push(parse_step(ctx, field)?);
                step_origins.push(ctx.origin(field));
            }
            other => return Err(unknown_field(ctx, field, other, "ChallengeDef")),
        }
    }

    let description =
        description.ok_or_else(|| missing_field(ctx, node, "description", "ChallengeDef"))?;
    let reward = reward.ok_or_else(|| missing_field(ctx, node, "reward", "ChallengeDef"))?;
    if steps.is_empty() {
        return Err(missing_field(ctx, node, "step", "ChallengeDef"));
    }

    Ok((
        ChallengeDef {
            id,
            title,
            description,
            steps,
            reward,
        },
        step_origins,
    ))
}

fn parse_step(ctx: &DocCtx<'_, '_>, node: Node<'_, '_>) -> Result<StepDef, ContentCompileError> {
    let description = required_text(ctx, node, "step")?;
    let trigger = match (node.attribute("talk"), node.attribute("near")) {
        (Some(npc), None) if !npc.trim().is_empty() => StepTrigger::Talk {
            npc: npc.trim().to_string(),
        },
        (None, Some(tag)) if !tag.trim().is_empty() => {
            let radius = match node.attribute("radius") {
                Some(value) => parse_positive(ctx, node, "radius", value)?,
                None => DEFAULT_NEAR_RADIUS,
            };
            StepTrigger::Near {
                tag: tag.trim().to_string(),
                radius,
            }
        }
        _ => {
            return Err(ctx.error(
                ContentErrorCode::InvalidValue,
                "<step> needs exactly one non-empty trigger attribute: talk or near".to_string(),
                node,
            ))
        }
    };
    let say = node
        .attribute("say")
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string);

    Ok(StepDef {
        description,
        trigger,
        say,
    })
}

/// Element children of a def, rejecting repeats of non-repeatable fields.
fn def_fields<'a, 'input>(
    ctx: &DocCtx<'_, '_>,
    node: Node<'a, 'input>,
    def_kind: &str,
    repeatable: &[&str],
) -> Result<Vec<Node<'a, 'input>>, ContentCompileError> {
    let mut seen_fields = HashSet::<&str>::new();
    let mut fields = Vec::new();
    for field in node.children().filter(|child| child.is_element()) {
        let field_name = field.tag_name().name();
        if !repeatable.contains(&field_name) && !seen_fields.insert(field_name) {
            return Err(ctx.error(
                ContentErrorCode::DuplicateField,
                format!("duplicate field <{field_name}> in <{def_kind}>"),
                field,
            ));
        }
        fields.push(field);
    }
    Ok(fields)
}

fn required_text(
    ctx: &DocCtx<'_, '_>,
    node: Node<'_, '_>,
    field_name: &str,
) -> Result<String, ContentCompileError> {
    let value = node.text().map(str::trim).unwrap_or_default().to_string();
    if value.is_empty() {
        return Err(ctx.error(
            ContentErrorCode::MissingField,
            format!("field <{field_name}> must not be empty"),
            node,
        ));
    }
    Ok(value)
}

fn required_attr<'a>(
    ctx: &DocCtx<'_, '_>,
    node: Node<'a, '_>,
    element: &str,
    attr: &str,
) -> Result<&'a str, ContentCompileError> {
    match node.attribute(attr).map(str::trim) {
        Some(value) if !value.is_empty() => Ok(value),
        _ => Err(ctx.error(
            ContentErrorCode::MissingField,
            format!("missing required attribute '{attr}' on <{element}>"),
            node,
        )),
    }
}

fn parse_f32(
    ctx: &DocCtx<'_, '_>,
    node: Node<'_, '_>,
    field_name: &str,
    value: &str,
) -> Result<f32, ContentCompileError> {
    match value.trim().parse::<f32>() {
        Ok(parsed) if parsed.is_finite() => Ok(parsed),
        _ => Err(ctx.error(
            ContentErrorCode::InvalidValue,
            format!("{field_name} '{value}' is not a finite number"),
            node,
        )),
    }
}

fn parse_positive(
    ctx: &DocCtx<'_, '_>,
    node: Node<'_, '_>,
    field_name: &str,
    value: &str,
) -> Result<f32, ContentCompileError> {
    let parsed = parse_f32(ctx, node, field_name, value)?;
    if parsed <= 0.0 {
        return Err(ctx.error(
            ContentErrorCode::InvalidValue,
            format!("{field_name} must be > 0"),
            node,
        ));
    }
    Ok(parsed)
}

fn parse_vec3(
    ctx: &DocCtx<'_, '_>,
    node: Node<'_, '_>,
    field_name: &str,
    value: &str,
) -> Result<Vec3, ContentCompileError> {
    let parts = value
        .split(|ch: char| ch.is_whitespace() || ch == ',')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>();
    if parts.len() != 3 {
        return Err(ctx.error(
            ContentErrorCode::InvalidValue,
            format!("{field_name} '{value}' must be three numbers 'x y z'"),
            node,
        ));
    }
    Ok(Vec3::new(
        parse_f32(ctx, node, field_name, parts[0])?,
        parse_f32(ctx, node, field_name, parts[1])?,
        parse_f32(ctx, node, field_name, parts[2])?,
    ))
}

fn parse_bool(
    ctx: &DocCtx<'_, '_>,
    node: Node<'_, '_>,
    field_name: &str,
    value: &str,
) -> Result<bool, ContentCompileError> {
    match value {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(ctx.error(
            ContentErrorCode::InvalidValue,
            format!("{field_name} '{value}' must be true or false"),
            node,
        )),
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

fn unknown_field(
    ctx: &DocCtx<'_, '_>,
    node: Node<'_, '_>,
    field_name: &str,
    def_kind: &str,
) -> ContentCompileError {
    ctx.error(
        ContentErrorCode::UnknownField,
        format!("unknown field <{field_name}> in <{def_kind}>"),
        node,
    )
}

fn missing_field(
    ctx: &DocCtx<'_, '_>,
    node: Node<'_, '_>,
    field_name: &str,
    def_kind: &str,
) -> ContentCompileError {
    ctx.error(
        ContentErrorCode::MissingField,
        format!("missing required field <{field_name}> in <{def_kind}>"),
        node,
    )
}

fn read_error(path: PathBuf, source: std::io::Error) -> ContentCompileError {
    ContentCompileError {
        code: ContentErrorCode::ReadFile,
        message: format!("failed to read content: {source}"),
        file_path: path,
        location: None,
    }
}
