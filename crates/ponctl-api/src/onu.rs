// ONU queries and single-command operations

use tracing::debug;

use crate::client::UnmClient;
use crate::command::{Command, OnuEndpoint, PonAddress};
use crate::deadline::Deadline;
use crate::decode::{decode_onu_list, decode_optical_info};
use crate::error::Error;
use crate::models::{OnuSummary, OpticalInfo};
use crate::transport::Transport;

impl<T: Transport> UnmClient<T> {
    /// List the ONUs registered on one PON port.
    ///
    /// `filter` keeps rows whose name or description contains it,
    /// ignoring case.
    pub async fn list_onus(
        &self,
        deadline: &Deadline,
        pon: &PonAddress,
        filter: Option<&str>,
    ) -> Result<Vec<OnuSummary>, Error> {
        let onus = self
            .execute_with_retry(deadline, move || async move {
                let response = self.send_command(deadline, Command::ListOnus { pon }).await?;
                Ok(decode_onu_list(&response, filter))
            })
            .await?;

        debug!(olt = %pon.olt, slot = pon.slot, port = pon.port, count = onus.len(), "listed ONUs");
        Ok(onus)
    }

    /// Read the current optical measurements of one ONU.
    pub async fn optical_info(
        &self,
        deadline: &Deadline,
        onu: &OnuEndpoint,
    ) -> Result<OpticalInfo, Error> {
        self.execute_with_retry(deadline, move || async move {
            let response = self
                .send_command(deadline, Command::QueryOptical { onu })
                .await?;
            decode_optical_info(&response)
        })
        .await
    }

    /// Remove an ONU registration.
    pub async fn delete_onu(&self, deadline: &Deadline, onu: &OnuEndpoint) -> Result<(), Error> {
        self.execute_with_retry(deadline, move || async move {
            self.send_command(deadline, Command::DeleteOnu { onu })
                .await
                .map(drop)
        })
        .await
    }

    /// Enable LAN port 1 of an ONU.
    pub async fn activate_lan_port(
        &self,
        deadline: &Deadline,
        onu: &OnuEndpoint,
    ) -> Result<(), Error> {
        self.execute_with_retry(deadline, move || async move {
            self.send_command(deadline, Command::ActivateLanPort { onu })
                .await
                .map(drop)
        })
        .await
    }
}
