use super::{anomaly, event};
use crate::classifier::chain::Extraction;
use crate::classifier::registry::ClassifierContext;
use crate::classifier::types::{AddPoolDetail, EventDetail};
use crate::transaction::types::{Instruction, RawTransaction};

pub fn matches(tx: &RawTransaction, ctx: &ClassifierContext) -> bool {
    pool_instruction(tx, ctx).is_some()
}

pub fn extract(tx: &RawTransaction, ctx: &ClassifierContext) -> Extraction {
    let Some(ix) = pool_instruction(tx, ctx) else {
        return anomaly("no pool-creation instruction");
    };
    let Some(pool) = ix.accounts.first() else {
        return anomaly(format!("{} instruction has no accounts", ix.program_id));
    };

    event(
        tx,
        EventDetail::AddPool(AddPoolDetail {
            pool: pool.clone(),
            venue: ctx.programs.pool_venue(&ix.program_id),
            initiator: tx.fee_payer().map(|payer| ctx.wallets.participant(payer)),
        }),
    )
}

fn pool_instruction<'a>(tx: &'a RawTransaction, ctx: &ClassifierContext) -> Option<&'a Instruction> {
    tx.instructions()
        .find(|ix| ctx.programs.is_pool_program(&ix.program_id))
}
