use tokio::sync::oneshot;

use crate::connection::{BackendOutput, StatementId, StatementInfo};
use crate::error::SqlParamsError;
use crate::types::WireValue;

pub(super) type Reply<T> = oneshot::Sender<Result<T, SqlParamsError>>;

pub(super) enum Command {
    ExecuteBatch {
        query: String,
        respond_to: Reply<()>,
    },
    Execute {
        query: String,
        params: Vec<WireValue>,
        respond_to: Reply<BackendOutput>,
    },
    Prepare {
        query: String,
        respond_to: Reply<StatementInfo>,
    },
    ExecutePrepared {
        id: StatementId,
        params: Vec<WireValue>,
        respond_to: Reply<BackendOutput>,
    },
    /// `respond_to` is `None` for releases queued from `Drop`.
    Release {
        id: StatementId,
        respond_to: Option<Reply<()>>,
    },
    Shutdown,
}
