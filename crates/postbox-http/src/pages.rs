//! Embedded admin console. Single-file HTML with inline script; the page
//! talks to `/admin-api/*` and carries the password on every call.

use axum::{
    extract::{Query, State},
    http::HeaderMap,
    response::Html,
};

use crate::{admin_api::AdminQuery, auth::password_ok, AppState};

pub async fn admin_page(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<AdminQuery>,
) -> Html<&'static str> {
    if password_ok(&state.cfg, &headers, query.password.as_deref()) {
        Html(CONSOLE_HTML)
    } else {
        Html(LOGIN_HTML)
    }
}

const LOGIN_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>Relay Admin — Login</title>
<style>
  body { font-family: system-ui, sans-serif; display: flex; justify-content: center;
         align-items: center; height: 100vh; margin: 0; background: #f4f5f7; }
  form { background: #fff; padding: 2rem; border-radius: 8px;
         box-shadow: 0 1px 4px rgba(0,0,0,.15); }
  input, button { font-size: 1rem; padding: .5rem; margin-top: .5rem; width: 100%;
                  box-sizing: border-box; }
  button { background: #2563eb; color: #fff; border: 0; border-radius: 4px; cursor: pointer; }
</style>
</head>
<body>
<form onsubmit="go(event)">
  <h2>Relay Admin</h2>
  <input id="pw" type="password" placeholder="Password" autofocus>
  <button type="submit">Sign in</button>
</form>
<script>
function go(e) {
  e.preventDefault();
  const pw = document.getElementById('pw').value;
  location.href = '/admin?password=' + encodeURIComponent(pw);
}
</script>
</body>
</html>"#;

const CONSOLE_HTML: &str = r##"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>Relay Admin</title>
<style>
  body { font-family: system-ui, sans-serif; max-width: 960px; margin: 2rem auto;
         padding: 0 1rem; color: #111; }
  h1 { font-size: 1.4rem; }
  section { margin: 1.5rem 0; padding: 1rem; border: 1px solid #ddd; border-radius: 8px; }
  table { border-collapse: collapse; width: 100%; }
  th, td { text-align: left; padding: .4rem .6rem; border-bottom: 1px solid #eee; }
  input, textarea, button, select { font-size: .95rem; padding: .4rem; }
  button { background: #2563eb; color: #fff; border: 0; border-radius: 4px; cursor: pointer; }
  button.danger { background: #dc2626; }
  .muted { color: #666; font-size: .85rem; }
  #status { min-height: 1.2rem; color: #166534; }
</style>
</head>
<body>
<h1>Relay Admin</h1>
<div id="status"></div>

<section>
  <h2>Fraud list</h2>
  <input id="search" placeholder="Search id substring">
  <button onclick="loadUsers()">Search</button>
  <a id="export" href="#">Export ids</a>
  <table>
    <thead><tr><th>User id</th><th>Added</th><th>Blocked</th><th></th></tr></thead>
    <tbody id="users"></tbody>
  </table>
</section>

<section>
  <h2>Add</h2>
  <input id="add-id" placeholder="User id">
  <button onclick="addOne()">Add &amp; block</button>
  <p class="muted">Batch (one id per line, max 1000):</p>
  <textarea id="add-batch" rows="4" cols="40"></textarea>
  <button onclick="addBatch()">Add batch</button>
</section>

<section>
  <h2>Maintenance</h2>
  <select id="cleanup-type">
    <option value="messages">Routed messages</option>
    <option value="unblocked_users">Stale unblocked users</option>
    <option value="all">Both</option>
  </select>
  older than <input id="cleanup-days" type="number" value="30" min="0" style="width:4rem"> days
  <button class="danger" onclick="runCleanup()">Delete</button>
</section>

<script>
const password = new URLSearchParams(location.search).get('password') || '';
const authHeaders = { 'Authorization': 'Bearer ' + password, 'Content-Type': 'application/json' };
document.getElementById('export').href = '/admin-api/export-ids?password=' + encodeURIComponent(password);

function note(text) { document.getElementById('status').textContent = text; }

async function api(path, options) {
  const res = await fetch(path, Object.assign({ headers: authHeaders }, options));
  const body = await res.json();
  if (!res.ok) throw new Error(body.error || res.statusText);
  return body;
}

async function loadUsers() {
  const search = encodeURIComponent(document.getElementById('search').value);
  const body = await api('/admin-api/fraud-users?search=' + search);
  const rows = body.users.map(u =>
    `<tr><td>${u.user_id}</td>` +
    `<td>${new Date(u.created_at).toISOString().slice(0, 10)}</td>` +
    `<td>${u.blocked ? 'yes' : 'no'}</td>` +
    `<td><button onclick="toggle('${u.user_id}', ${!u.blocked})">${u.blocked ? 'Unblock' : 'Block'}</button> ` +
    `<button class="danger" onclick="del('${u.user_id}')">Delete</button></td></tr>`);
  document.getElementById('users').innerHTML = rows.join('');
}

async function addOne() {
  const user_id = document.getElementById('add-id').value.trim();
  if (!user_id) return;
  await api('/admin-api/add-user', { method: 'POST', body: JSON.stringify({ user_id }) });
  note('Added ' + user_id);
  loadUsers();
}

async function addBatch() {
  const user_ids = document.getElementById('add-batch').value
    .split('\n').map(s => s.trim()).filter(Boolean);
  if (!user_ids.length) return;
  const body = await api('/admin-api/add-users-batch',
    { method: 'POST', body: JSON.stringify({ user_ids }) });
  note(`Batch: ${body.report.succeeded} ok, ${body.report.failed} failed`);
  loadUsers();
}

async function toggle(user_id, block) {
  await api('/admin-api/toggle-block', { method: 'POST', body: JSON.stringify({ user_id, block }) });
  loadUsers();
}

async function del(user_id) {
  if (!confirm('Remove ' + user_id + ' from both tables?')) return;
  await api('/admin-api/delete-user', { method: 'POST', body: JSON.stringify({ user_id }) });
  loadUsers();
}

async function runCleanup() {
  const cleanup_type = document.getElementById('cleanup-type').value;
  const days = parseInt(document.getElementById('cleanup-days').value, 10);
  const body = await api('/admin-api/cleanup',
    { method: 'POST', body: JSON.stringify({ cleanup_type, days }) });
  note(`Deleted ${body.routes_deleted} routes, ${body.unblocked_deleted} stale users`);
}

loadUsers().catch(e => note('Error: ' + e.message));
</script>
</body>
</html>"##;
