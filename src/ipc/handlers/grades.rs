use crate::grades::GradeLedger;
use crate::ipc::helpers::{
    get_optional_str, get_required_id, get_required_number, get_required_str, to_result,
    with_store, HandlerErr,
};
use crate::ipc::types::{AppState, Request};
use crate::model::ScoreType;
use crate::store::Store;

type HandlerResult = Result<serde_json::Value, HandlerErr>;

fn parse_scoretype(params: &serde_json::Value) -> Result<ScoreType, HandlerErr> {
    Ok(get_required_str(params, "scoretype")?.parse::<ScoreType>()?)
}

fn grades_create(store: &Store, params: &serde_json::Value) -> HandlerResult {
    let scoretype = parse_scoretype(params)?;
    let perfectscore = get_required_number(params, "perfectscore")?;
    let date = get_optional_str(params, "attendanceDate");
    to_result(GradeLedger::new(store).define_grade(scoretype, perfectscore, date)?)
}

fn grades_create_attendance(store: &Store, params: &serde_json::Value) -> HandlerResult {
    let date = get_optional_str(params, "attendanceDate");
    to_result(GradeLedger::new(store).define_attendance_grade(date)?)
}

fn grades_delete(store: &Store, params: &serde_json::Value) -> HandlerResult {
    let gradeid = get_required_id(params, "gradeid")?;
    to_result(GradeLedger::new(store).remove_grade(gradeid)?)
}

fn grades_update_perfect_score(store: &Store, params: &serde_json::Value) -> HandlerResult {
    let gradeid = get_required_id(params, "gradeid")?;
    let perfectscore = get_required_number(params, "perfectscore")?;
    to_result(GradeLedger::new(store).revise_ceiling(gradeid, perfectscore)?)
}

fn grades_update_score(store: &Store, params: &serde_json::Value) -> HandlerResult {
    let scoreid = get_required_id(params, "scoreid")?;
    let score = get_required_number(params, "score")?;
    to_result(GradeLedger::new(store).record_score(scoreid, score)?)
}

fn grades_update_attendance(store: &Store, params: &serde_json::Value) -> HandlerResult {
    let scoreid = get_required_id(params, "scoreid")?;
    let status = get_required_str(params, "attendanceStatus")?;
    to_result(GradeLedger::new(store).record_attendance(scoreid, &status)?)
}

fn grades_statuses(store: &Store, _params: &serde_json::Value) -> HandlerResult {
    to_result(GradeLedger::new(store).list_attendance_status_catalog()?)
}

fn grades_by_score_type(store: &Store, params: &serde_json::Value) -> HandlerResult {
    let scoretype = parse_scoretype(params)?;
    to_result(GradeLedger::new(store).gradebook(scoretype)?)
}

fn grades_attendance(store: &Store, _params: &serde_json::Value) -> HandlerResult {
    to_result(GradeLedger::new(store).attendance_gradebook()?)
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let handler: fn(&Store, &serde_json::Value) -> HandlerResult = match req.method.as_str() {
        "grades.create" => grades_create,
        "grades.createAttendance" => grades_create_attendance,
        "grades.delete" => grades_delete,
        "grades.updatePerfectScore" => grades_update_perfect_score,
        "grades.updateScore" => grades_update_score,
        "grades.updateAttendance" => grades_update_attendance,
        "grades.statuses" => grades_statuses,
        "grades.byScoreType" => grades_by_score_type,
        "grades.attendance" => grades_attendance,
        _ => return None,
    };
    Some(with_store(state, req, handler))
}
