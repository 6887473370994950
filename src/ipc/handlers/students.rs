use crate::ipc::helpers::{get_required_id, to_result, with_store, HandlerErr};
use crate::ipc::types::{AppState, Request};
use crate::store::Store;
use crate::students::StudentRegistry;

type HandlerResult = Result<serde_json::Value, HandlerErr>;

fn students_create(store: &Store, params: &serde_json::Value) -> HandlerResult {
    // A missing or non-string name is the same failure as a blank one.
    let name = params
        .get("studentName")
        .and_then(|v| v.as_str())
        .unwrap_or("");
    to_result(StudentRegistry::new(store).register(name)?)
}

fn students_list(store: &Store, _params: &serde_json::Value) -> HandlerResult {
    to_result(StudentRegistry::new(store).list_all()?)
}

fn students_delete(store: &Store, params: &serde_json::Value) -> HandlerResult {
    let studentgradeid = get_required_id(params, "studentgradeid")?;
    to_result(StudentRegistry::new(store).remove(studentgradeid)?)
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "students.create" => Some(with_store(state, req, students_create)),
        "students.list" => Some(with_store(state, req, students_list)),
        "students.delete" => Some(with_store(state, req, students_delete)),
        _ => None,
    }
}
