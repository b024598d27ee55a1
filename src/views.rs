//! HTML views rendered with built-in Tera templates.

use crate::collection::{CollectionSchema, PASSWORD_COLUMN};
use crate::error::AppError;
use crate::store::Record;
use axum::response::Html;
use serde::Serialize;
use serde_json::Value;
use tera::{Context, Tera};

const BASE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <title>{% block title %}Food Pantry{% endblock %}</title>
  <link rel="stylesheet" href="/css/styles.css">
</head>
<body>
  <nav>
    <a href="/">Home</a>
    <a href="/database">Database</a>
    <a href="/signUp">Sign up</a>
    <a href="/login">Log in</a>
    <a href="/logout">Log out</a>
  </nav>
  <main>{% block content %}{% endblock %}</main>
</body>
</html>
"#;

const HOME: &str = r#"{% extends "base.html" %}
{% block content %}
<h1>Food Pantry</h1>
<p>Customers can sign up for pantry service. Staff can log in to manage customers, employees and orders.</p>
{% endblock %}
"#;

const LOGIN: &str = r#"{% extends "base.html" %}
{% block title %}Log in{% endblock %}
{% block content %}
<h1>Staff login</h1>
{% if error_message %}<p class="error">{{ error_message }}</p>{% endif %}
<form method="post" action="/login">
  <label>Username <input name="username" required></label>
  <label>Password <input name="password" type="password" required></label>
  <button type="submit">Log in</button>
</form>
{% endblock %}
"#;

const SIGN_UP: &str = r#"{% extends "base.html" %}
{% block title %}Sign up{% endblock %}
{% block content %}
<h1>Customer sign-up</h1>
{% if id %}
<p class="success">Thank you! Your customer number is <strong>{{ id }}</strong>{% if selected_location %} at {{ selected_location }}{% endif %}.</p>
{% endif %}
<form method="post" action="/signUp">
  {% for column in columns %}
  <label>{{ column }} <input name="{{ column }}"></label>
  {% endfor %}
  <button type="submit">Sign up</button>
</form>
{% endblock %}
"#;

const DATABASE: &str = r#"{% extends "base.html" %}
{% block title %}{{ current_table }}{% endblock %}
{% block content %}
<h1>{{ current_table }}</h1>
<p>Signed in as {{ username }} ({{ role }})</p>
{% if error_message %}<p class="error">{{ error_message }}</p>{% endif %}
<form method="get" action="/database">
  <select name="table">
    {% for t in tables %}<option value="{{ t }}"{% if t == current_table %} selected{% endif %}>{{ t }}</option>{% endfor %}
  </select>
  <select name="col">
    {% for c in columns %}<option value="{{ c }}"{% if c == col %} selected{% endif %}>{{ c }}</option>{% endfor %}
  </select>
  <input name="search" value="{{ search_term }}" placeholder="Search">
  <input type="hidden" name="sortColumn" value="{{ current_sort_column }}">
  <input type="hidden" name="sortOrder" value="{{ current_sort_order }}">
  <button type="submit">Search</button>
</form>
<p><a href="/add/{{ current_table }}">Add to {{ current_table }}</a></p>
<table>
  <thead><tr>
    {% for c in columns %}
    <th><a href="/database?table={{ current_table | urlencode }}&search={{ search_term | urlencode }}&col={{ col | urlencode }}&sortColumn={{ c | urlencode }}&sortOrder={% if c == current_sort_column and current_sort_order == "asc" %}desc{% else %}asc{% endif %}">{{ c }}</a></th>
    {% endfor %}
    <th></th>
  </tr></thead>
  <tbody>
    {% for row in rows %}
    <tr>
      {% for cell in row.cells %}<td>{{ cell }}</td>{% endfor %}
      <td>
        <a href="/edit/{{ current_table }}/{{ row.id | urlencode }}">Edit</a>
        <button type="button" class="delete" data-url="/delete/{{ current_table }}/{{ row.id | urlencode }}">Delete</button>
      </td>
    </tr>
    {% endfor %}
  </tbody>
</table>
<script>
document.querySelectorAll("button.delete").forEach(function (button) {
  button.addEventListener("click", async function () {
    if (!confirm("Delete this record?")) return;
    const res = await fetch(button.dataset.url, { method: "POST" });
    if (res.ok) {
      location.reload();
      return;
    }
    const body = await res.json().catch(function () { return {}; });
    alert(body.error ? body.error.message : "Delete failed");
  });
});
</script>
{% endblock %}
"#;

const ADD: &str = r#"{% extends "base.html" %}
{% block title %}Add to {{ table }}{% endblock %}
{% block content %}
<h1>Add to {{ table }}</h1>
{% if error_message %}<p class="error">{{ error_message }}</p>{% endif %}
<form method="post" action="/add/{{ table }}">
  {% for column in columns %}
  <label>{{ column }} <input name="{{ column }}"{% if column == secret_column %} type="password"{% endif %}></label>
  {% endfor %}
  <button type="submit">Add</button>
</form>
{% endblock %}
"#;

const EDIT: &str = r#"{% extends "base.html" %}
{% block title %}Edit {{ table }} {{ id }}{% endblock %}
{% block content %}
<h1>Edit {{ table }} {{ id }}</h1>
{% if error_message %}<p class="error">{{ error_message }}</p>{% endif %}
<form method="post" action="/edit/{{ table }}/{{ id | urlencode }}">
  {% for field in fields %}
  <label>{{ field.name }} <input name="{{ field.name }}" value="{{ field.value }}"></label>
  {% endfor %}
  <button type="submit">Save</button>
</form>
{% endblock %}
"#;

/// Display text for a stored value.
pub fn display(v: &Value) -> String {
    match v {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[derive(Serialize)]
pub struct RowView {
    pub id: String,
    pub cells: Vec<String>,
}

#[derive(Serialize)]
pub struct DatabasePage {
    pub current_table: String,
    pub tables: Vec<&'static str>,
    pub columns: Vec<String>,
    pub rows: Vec<RowView>,
    pub username: String,
    pub role: String,
    pub error_message: String,
    pub search_term: String,
    pub col: String,
    pub current_sort_column: String,
    pub current_sort_order: String,
}

impl DatabasePage {
    /// Table of `records` with visible columns in schema order.
    pub fn new(schema: &CollectionSchema, records: &[Record]) -> Self {
        let columns: Vec<String> = schema.visible_columns().iter().map(|c| c.name.clone()).collect();
        let rows = records
            .iter()
            .map(|r| RowView {
                id: r.get(schema.identity_column()).map(display).unwrap_or_default(),
                cells: columns
                    .iter()
                    .map(|c| r.get(c).map(display).unwrap_or_default())
                    .collect(),
            })
            .collect();
        DatabasePage {
            current_table: schema.name().to_string(),
            tables: crate::collection::CollectionRegistry::collections()
                .iter()
                .map(|c| c.name)
                .collect(),
            columns,
            rows,
            username: String::new(),
            role: String::new(),
            error_message: String::new(),
            search_term: String::new(),
            col: String::new(),
            current_sort_column: String::new(),
            current_sort_order: "asc".to_string(),
        }
    }
}

#[derive(Serialize)]
struct FieldView {
    name: String,
    value: String,
}

pub struct Views {
    tera: Tera,
}

impl Views {
    pub fn new() -> Result<Self, AppError> {
        let mut tera = Tera::default();
        tera.add_raw_templates(vec![
            ("base.html", BASE),
            ("home.html", HOME),
            ("login.html", LOGIN),
            ("sign_up.html", SIGN_UP),
            ("database.html", DATABASE),
            ("add.html", ADD),
            ("edit.html", EDIT),
        ])?;
        Ok(Views { tera })
    }

    fn render(&self, template: &str, context: &Context) -> Result<Html<String>, AppError> {
        Ok(Html(self.tera.render(template, context)?))
    }

    pub fn home(&self) -> Result<Html<String>, AppError> {
        self.render("home.html", &Context::new())
    }

    pub fn login(&self, error_message: &str) -> Result<Html<String>, AppError> {
        let mut ctx = Context::new();
        ctx.insert("error_message", error_message);
        self.render("login.html", &ctx)
    }

    pub fn sign_up(
        &self,
        schema: &CollectionSchema,
        id: Option<String>,
        selected_location: Option<String>,
    ) -> Result<Html<String>, AppError> {
        let mut ctx = Context::new();
        let columns: Vec<&str> = schema.input_columns().iter().map(|c| c.name.as_str()).collect();
        ctx.insert("columns", &columns);
        ctx.insert("id", &id);
        ctx.insert("selected_location", &selected_location);
        self.render("sign_up.html", &ctx)
    }

    pub fn database(&self, page: &DatabasePage) -> Result<Html<String>, AppError> {
        self.render("database.html", &Context::from_serialize(page)?)
    }

    pub fn add(&self, schema: &CollectionSchema, error_message: &str) -> Result<Html<String>, AppError> {
        let mut ctx = Context::new();
        let columns: Vec<&str> = schema.input_columns().iter().map(|c| c.name.as_str()).collect();
        ctx.insert("table", schema.name());
        ctx.insert("columns", &columns);
        ctx.insert("secret_column", if schema.collection.is_hidden(PASSWORD_COLUMN) { PASSWORD_COLUMN } else { "" });
        ctx.insert("error_message", error_message);
        self.render("add.html", &ctx)
    }

    /// Edit form prefilled from `record`. Neither the identity column nor a
    /// hidden one is offered; leaving a field out keeps its stored value.
    pub fn edit(&self, schema: &CollectionSchema, id: &str, record: &Record) -> Result<Html<String>, AppError> {
        let fields: Vec<FieldView> = schema
            .visible_columns()
            .into_iter()
            .filter(|c| c.name != schema.identity_column())
            .map(|c| FieldView {
                name: c.name.clone(),
                value: record.get(&c.name).map(display).unwrap_or_default(),
            })
            .collect();
        let mut ctx = Context::new();
        ctx.insert("table", schema.name());
        ctx.insert("id", id);
        ctx.insert("fields", &fields);
        ctx.insert("error_message", "");
        self.render("edit.html", &ctx)
    }
}
