//! Structural validation of candidate commands.
//!
//! Every command passes the envelope checks (parseable path, value present
//! unless deleting). Commands whose path matches a row of the schema table
//! must also carry a value of the required shape. Validation never repairs:
//! one violated rule rejects the whole command.

use serde_json::{Map, Value};
use thiserror::Error;
use tianji_domain::{
    paths, Command, CommandAction, DaoPath, Item, Location, NpcProfile, NpcRealm, Path,
    PlayerRealm, QualityTier, Quest, StatusEffect,
};

use super::matcher::PathMatcher;
use super::payload::CommandPayload;

/// A command that passed validation, with its path parsed and payload typed.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedCommand {
    pub action: CommandAction,
    pub path: Path,
    pub value: Option<Value>,
    pub payload: CommandPayload,
}

impl ValidatedCommand {
    /// The value, or `null` for deletes.
    pub fn value_or_null(&self) -> Value {
        self.value.clone().unwrap_or(Value::Null)
    }

    /// Realm name this command would write, including one nested in a whole
    /// `player` record.
    pub fn realm_name(&self) -> Option<&str> {
        self.payload.realm_name().or_else(|| {
            if !self.path.is(paths::PLAYER) {
                return None;
            }
            self.value.as_ref()?.get("realm")?.get("name")?.as_str()
        })
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
#[error("command `{command}` rejected: {}", errors.join("; "))]
pub struct ValidationRejected {
    pub command: String,
    pub errors: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Shape {
    PlayerRealm,
    RealmName,
    Location,
    StatusEffect,
    Item,
    Npc,
    NpcRealm,
    Dao,
    Quest,
}

struct SchemaRule {
    matcher: PathMatcher,
    actions: &'static [CommandAction],
    /// Sub-path keys that take the path out of this rule
    except_keys: &'static [&'static str],
    shape: Shape,
}

static NULL: Value = Value::Null;

const SET: &[CommandAction] = &[CommandAction::Set];
const PUSH: &[CommandAction] = &[CommandAction::Push];

/// Schema table. The first matching row decides the shape.
const SCHEMA: &[SchemaRule] = &[
    SchemaRule {
        matcher: PathMatcher::Exact(paths::PLAYER_REALM),
        actions: SET,
        except_keys: &[],
        shape: Shape::PlayerRealm,
    },
    SchemaRule {
        matcher: PathMatcher::Exact(paths::PLAYER_REALM_NAME),
        actions: SET,
        except_keys: &[],
        shape: Shape::RealmName,
    },
    SchemaRule {
        matcher: PathMatcher::Exact(paths::PLAYER_LOCATION),
        actions: SET,
        except_keys: &[],
        shape: Shape::Location,
    },
    SchemaRule {
        matcher: PathMatcher::Exact(paths::PLAYER_STATUS_EFFECTS),
        actions: PUSH,
        except_keys: &[],
        shape: Shape::StatusEffect,
    },
    SchemaRule {
        matcher: PathMatcher::Exact(paths::INVENTORY_ITEMS),
        actions: PUSH,
        except_keys: &[],
        shape: Shape::Item,
    },
    SchemaRule {
        matcher: PathMatcher::Under(paths::INVENTORY_ITEMS),
        actions: SET,
        except_keys: &["quantity", "progress"],
        shape: Shape::Item,
    },
    SchemaRule {
        matcher: PathMatcher::ChildOf(paths::RELATIONS),
        actions: SET,
        except_keys: &[],
        shape: Shape::Npc,
    },
    SchemaRule {
        matcher: PathMatcher::UnderEndingIn(paths::RELATIONS, "realm"),
        actions: SET,
        except_keys: &[],
        shape: Shape::NpcRealm,
    },
    SchemaRule {
        matcher: PathMatcher::ChildOf(paths::DAO_PATHS),
        actions: SET,
        except_keys: &[],
        shape: Shape::Dao,
    },
    SchemaRule {
        matcher: PathMatcher::Exact(paths::QUESTS_ACTIVE),
        actions: PUSH,
        except_keys: &[],
        shape: Shape::Quest,
    },
];

impl SchemaRule {
    fn applies(&self, action: CommandAction, path: &Path) -> bool {
        self.actions.contains(&action)
            && self.matcher.matches(path)
            && !path
                .segments()
                .iter()
                .any(|segment| self.except_keys.iter().any(|key| segment.is_key(key)))
    }
}

/// Validates commands against the schema table.
#[derive(Debug, Default, Clone, Copy)]
pub struct CommandValidator;

impl CommandValidator {
    pub fn new() -> Self {
        Self
    }

    pub fn validate(&self, command: &Command) -> Result<ValidatedCommand, ValidationRejected> {
        let reject = |errors: Vec<String>| ValidationRejected {
            command: command.to_string(),
            errors,
        };

        let path = Path::parse(&command.key).map_err(|e| reject(vec![e.to_string()]))?;

        if command.action.requires_value() && command.value.is_none() {
            return Err(reject(vec![format!(
                "`{}` requires a value",
                command.action
            )]));
        }

        let Some(rule) = SCHEMA.iter().find(|rule| rule.applies(command.action, &path)) else {
            return Ok(ValidatedCommand {
                action: command.action,
                path,
                value: command.value.clone(),
                payload: CommandPayload::Raw,
            });
        };

        let value = command.value.as_ref().unwrap_or(&NULL);
        let payload = check_shape(rule.shape, value).map_err(reject)?;

        Ok(ValidatedCommand {
            action: command.action,
            path,
            value: command.value.clone(),
            payload,
        })
    }
}

// =============================================================================
// Shape checks
// =============================================================================

fn check_shape(shape: Shape, value: &Value) -> Result<CommandPayload, Vec<String>> {
    let mut errors = Vec::new();

    if shape == Shape::RealmName {
        return match value.as_str() {
            Some(name) if !name.trim().is_empty() => Ok(CommandPayload::RealmName(name.to_string())),
            _ => Err(vec!["realm name must be a non-empty string".to_string()]),
        };
    }

    let Some(map) = value.as_object() else {
        return Err(vec![format!("{} must be a record", shape_name(shape))]);
    };

    let mut check = Checker {
        map,
        errors: &mut errors,
        what: shape_name(shape),
    };
    match shape {
        Shape::PlayerRealm => check_player_realm(&mut check),
        Shape::Location => check_location(&mut check),
        Shape::StatusEffect => check_status_effect(&mut check),
        Shape::Item => check_item(&mut check),
        Shape::Npc => check_npc(&mut check),
        Shape::NpcRealm => check_npc_realm(map, &mut *check.errors),
        Shape::Dao => check_dao(&mut check),
        Shape::Quest => check_quest(&mut check),
        Shape::RealmName => {}
    }

    if !errors.is_empty() {
        return Err(errors);
    }

    typed(shape, value).map_err(|e| vec![format!("{}: {e}", shape_name(shape))])
}

fn typed(shape: Shape, value: &Value) -> Result<CommandPayload, serde_json::Error> {
    let v = value.clone();
    Ok(match shape {
        Shape::PlayerRealm => CommandPayload::PlayerRealm(serde_json::from_value::<PlayerRealm>(v)?),
        Shape::RealmName => CommandPayload::RealmName(serde_json::from_value::<String>(v)?),
        Shape::Location => CommandPayload::Location(serde_json::from_value::<Location>(v)?),
        Shape::StatusEffect => {
            CommandPayload::StatusEffect(serde_json::from_value::<StatusEffect>(v)?)
        }
        Shape::Item => CommandPayload::Item(Box::new(serde_json::from_value::<Item>(v)?)),
        Shape::Npc => CommandPayload::Npc(Box::new(serde_json::from_value::<NpcProfile>(v)?)),
        Shape::NpcRealm => CommandPayload::NpcRealm(serde_json::from_value::<NpcRealm>(v)?),
        Shape::Dao => CommandPayload::Dao(serde_json::from_value::<DaoPath>(v)?),
        Shape::Quest => CommandPayload::Quest(serde_json::from_value::<Quest>(v)?),
    })
}

fn shape_name(shape: Shape) -> &'static str {
    match shape {
        Shape::PlayerRealm => "player realm",
        Shape::RealmName => "realm name",
        Shape::Location => "location",
        Shape::StatusEffect => "status effect",
        Shape::Item => "item",
        Shape::Npc => "npc",
        Shape::NpcRealm => "npc realm",
        Shape::Dao => "dao path",
        Shape::Quest => "quest",
    }
}

struct Checker<'m, 'e> {
    map: &'m Map<String, Value>,
    errors: &'e mut Vec<String>,
    what: &'static str,
}

impl<'m> Checker<'m, '_> {
    fn fail(&mut self, message: String) {
        self.errors.push(format!("{}: {message}", self.what));
    }

    fn present(&mut self, field: &str) -> Option<&'m Value> {
        match self.map.get(field) {
            Some(Value::Null) | None => {
                self.fail(format!("missing field `{field}`"));
                None
            }
            Some(value) => Some(value),
        }
    }

    fn string(&mut self, field: &str) -> Option<&'m str> {
        let value = self.present(field)?;
        let text = value.as_str();
        if text.is_none() {
            self.fail(format!("`{field}` must be a string"));
        }
        text
    }

    fn number(&mut self, field: &str) -> Option<f64> {
        let value = self.present(field)?;
        let number = value.as_f64();
        if number.is_none() {
            self.fail(format!("`{field}` must be a number"));
        }
        number
    }

    fn boolean(&mut self, field: &str) -> Option<bool> {
        let value = self.present(field)?;
        let flag = value.as_bool();
        if flag.is_none() {
            self.fail(format!("`{field}` must be a boolean"));
        }
        flag
    }

    fn sequence(&mut self, field: &str) -> Option<&'m Vec<Value>> {
        let value = self.present(field)?;
        let items = value.as_array();
        if items.is_none() {
            self.fail(format!("`{field}` must be a sequence"));
        }
        items
    }

    fn record(&mut self, field: &str) -> Option<&'m Map<String, Value>> {
        let value = self.present(field)?;
        let record = value.as_object();
        if record.is_none() {
            self.fail(format!("`{field}` must be a record"));
        }
        record
    }
}

fn check_player_realm(check: &mut Checker<'_, '_>) {
    check.string("name");
    check.string("stage");
    check.number("currentProgress");
    check.number("nextThreshold");
    check.string("breakthroughNarrative");
}

fn check_location(check: &mut Checker<'_, '_>) {
    check.string("description");
    check.number("x");
    check.number("y");
}

fn check_status_effect(check: &mut Checker<'_, '_>) {
    check.string("name");
    if let Some(kind) = check.string("kind") {
        if kind != "buff" && kind != "debuff" {
            check.fail(format!("`kind` must be buff or debuff, got `{kind}`"));
        }
    }
    check.string("description");
    check.number("durationMinutes");
    check.record("createdAt");
}

fn check_item(check: &mut Checker<'_, '_>) {
    check.string("id");
    check.string("name");
    let category = check.string("category");
    check.string("description");

    if let Some(quality) = check.record("quality") {
        match quality.get("tier").and_then(Value::as_str) {
            Some(tier) if QualityTier::all().iter().any(|t| t.as_str() == tier) => {}
            Some(tier) => check.fail(format!("unknown quality tier `{tier}`")),
            None => check.fail("missing field `quality.tier`".to_string()),
        }
        match quality.get("grade").and_then(Value::as_f64) {
            Some(grade) if (0.0..=10.0).contains(&grade) => {}
            Some(grade) => check.fail(format!("`quality.grade` {grade} is outside 0-10")),
            None => check.fail("`quality.grade` must be a number".to_string()),
        }
    }

    if check.number("quantity").is_some() && check.map.get("quantity").and_then(Value::as_u64).is_none() {
        check.fail("`quantity` must be a non-negative integer".to_string());
    }

    if category.is_some_and(|c| c.eq_ignore_ascii_case(tianji_domain::value_objects::CATEGORY_TECHNIQUE)) {
        check_technique_skills(check);
    }
}

fn check_technique_skills(check: &mut Checker<'_, '_>) {
    let Some(skills) = check.sequence("skills") else {
        return;
    };
    if !(2..=5).contains(&skills.len()) {
        check.fail(format!("technique must list 2-5 skills, got {}", skills.len()));
        return;
    }
    let first_threshold = skills
        .first()
        .and_then(|skill| skill.get("unlockThreshold"))
        .and_then(Value::as_f64);
    if first_threshold != Some(0.0) {
        check.fail("first technique skill must have `unlockThreshold` 0".to_string());
    }
}

fn check_npc(check: &mut Checker<'_, '_>) {
    check.string("name");
    check.string("gender");
    check.number("age");
    if let Some(realm) = check.record("realm") {
        let mut realm_errors = Vec::new();
        check_npc_realm(realm, &mut realm_errors);
        for error in realm_errors {
            check.fail(error);
        }
    }
    check.string("role");
    check.present("traits");
    check.string("appearance");
    check.string("relationshipLabel");
    check.number("favor");
}

/// NPC realms carry exactly `name` and `stage`.
fn check_npc_realm(realm: &Map<String, Value>, errors: &mut Vec<String>) {
    for field in ["name", "stage"] {
        if realm.get(field).and_then(Value::as_str).is_none() {
            errors.push(format!("npc realm: `{field}` must be a string"));
        }
    }
    for field in realm.keys() {
        if field != "name" && field != "stage" {
            errors.push(format!("npc realm: unexpected field `{field}`"));
        }
    }
}

fn check_dao(check: &mut Checker<'_, '_>) {
    check.string("name");
    check.string("description");
    if let Some(stages) = check.sequence("stages") {
        if stages.len() < 2 {
            check.fail(format!("dao path needs at least 2 stages, got {}", stages.len()));
        }
    }
    check.boolean("unlocked");
}

fn check_quest(check: &mut Checker<'_, '_>) {
    for field in ["id", "name", "description", "status", "category"] {
        check.string(field);
    }
    check.sequence("objectives");
}
