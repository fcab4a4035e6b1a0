// TL1 command templates
//
// Every command the client speaks, rendered to its exact wire form.
// Arguments are interpolated verbatim: the UNM server has no escaping,
// and the correlation tag stays the literal `CTAG`.

use std::fmt;

use secrecy::{ExposeSecret, SecretString};
use strum::{Display, IntoStaticStr};

/// Addresses one PON port on one OLT: `OLTID=<olt>,PONID=NA-NA-<slot>-<port>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PonAddress {
    pub olt: String,
    pub slot: u32,
    pub port: u32,
}

impl PonAddress {
    pub fn new(olt: impl Into<String>, slot: u32, port: u32) -> Self {
        Self {
            olt: olt.into(),
            slot,
            port,
        }
    }
}

impl fmt::Display for PonAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "OLTID={},PONID=NA-NA-{}-{}",
            self.olt, self.slot, self.port
        )
    }
}

/// One ONU: its PON port plus its hardware (MAC-style) identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OnuEndpoint {
    pub pon: PonAddress,
    pub mac: String,
}

impl OnuEndpoint {
    pub fn new(pon: PonAddress, mac: impl Into<String>) -> Self {
        Self {
            pon,
            mac: mac.into(),
        }
    }
}

/// Which ONU interface a WAN service profile binds to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WanSelector {
    /// Numbered Ethernet user port.
    Uport(u8),
    /// Numbered wireless SSID.
    Ssid(u8),
}

impl fmt::Display for WanSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Uport(n) => write!(f, "UPORT={n}"),
            Self::Ssid(n) => write!(f, "SSID={n}"),
        }
    }
}

/// The WAN profiles configured on every provisioned ONU, in wire order.
pub const WAN_PROFILES: [WanSelector; 6] = [
    WanSelector::Uport(1),
    WanSelector::Uport(2),
    WanSelector::Uport(3),
    WanSelector::Uport(4),
    WanSelector::Ssid(1),
    WanSelector::Ssid(5),
];

/// Command verbs, safe to log (carry no arguments).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, IntoStaticStr)]
pub enum Verb {
    #[strum(serialize = "LOGIN")]
    Login,
    #[strum(serialize = "LOGOUT")]
    Logout,
    #[strum(serialize = "SHAKEHAND")]
    ShakeHand,
    #[strum(serialize = "LST-ONU")]
    ListOnus,
    #[strum(serialize = "LST-OMDDM")]
    QueryOptical,
    #[strum(serialize = "DEL-ONU")]
    DeleteOnu,
    #[strum(serialize = "ADD-ONU")]
    AddOnu,
    #[strum(serialize = "SET-WANSERVICE")]
    SetWanService,
    #[strum(serialize = "ACT-LANPORT")]
    ActivateLanPort,
}

/// Arguments of `SET-WANSERVICE` beyond the endpoint.
#[derive(Debug, Clone, Copy)]
pub struct WanService<'a> {
    pub vlan: &'a str,
    pub pppoe_user: &'a str,
    pub pppoe_password: &'a SecretString,
    pub selector: WanSelector,
}

/// Arguments of `ADD-ONU` beyond the endpoint.
#[derive(Debug, Clone, Copy)]
pub struct OnuLabel<'a> {
    pub client_name: &'a str,
    pub splitter: &'a str,
    pub splitter_port: &'a str,
    pub model: &'a str,
}

/// A fully-specified TL1 command.
///
/// `Debug` never prints secrets; use [`Command::to_wire`] for the bytes
/// that go on the socket.
#[derive(Debug, Clone, Copy)]
pub enum Command<'a> {
    Login {
        username: &'a str,
        password: &'a SecretString,
    },
    Logout,
    ShakeHand,
    ListOnus {
        pon: &'a PonAddress,
    },
    QueryOptical {
        onu: &'a OnuEndpoint,
    },
    DeleteOnu {
        onu: &'a OnuEndpoint,
    },
    AddOnu {
        onu: &'a OnuEndpoint,
        label: OnuLabel<'a>,
    },
    SetWanService {
        onu: &'a OnuEndpoint,
        service: WanService<'a>,
    },
    ActivateLanPort {
        onu: &'a OnuEndpoint,
    },
}

impl Command<'_> {
    pub fn verb(&self) -> Verb {
        match self {
            Self::Login { .. } => Verb::Login,
            Self::Logout => Verb::Logout,
            Self::ShakeHand => Verb::ShakeHand,
            Self::ListOnus { .. } => Verb::ListOnus,
            Self::QueryOptical { .. } => Verb::QueryOptical,
            Self::DeleteOnu { .. } => Verb::DeleteOnu,
            Self::AddOnu { .. } => Verb::AddOnu,
            Self::SetWanService { .. } => Verb::SetWanService,
            Self::ActivateLanPort { .. } => Verb::ActivateLanPort,
        }
    }

    /// Render the exact wire text, terminator included.
    pub fn to_wire(&self) -> String {
        let verb = self.verb();
        match self {
            Self::Login { username, password } => format!(
                "{verb}:::CTAG::UN={username},PWD={};",
                password.expose_secret()
            ),
            Self::Logout | Self::ShakeHand => format!("{verb}:::CTAG::;"),
            Self::ListOnus { pon } => format!("{verb}::{pon}:CTAG::;"),
            Self::QueryOptical { onu } | Self::ActivateLanPort { onu } => {
                let port_suffix = if matches!(self, Self::ActivateLanPort { .. }) {
                    ",ONUPORT=NA-NA-NA-1"
                } else {
                    ""
                };
                format!(
                    "{verb}::{},ONUIDTYPE=MAC,ONUID={}{port_suffix}:CTAG::;",
                    onu.pon, onu.mac
                )
            }
            Self::DeleteOnu { onu } => format!(
                "{verb}::{}:CTAG::ONUIDTYPE=MAC,ONUID={};",
                onu.pon, onu.mac
            ),
            Self::AddOnu { onu, label } => format!(
                "{verb}::{}:CTAG::AUTHTYPE=MAC,ONUID={},NAME={} | {} - {},ONUTYPE={};",
                onu.pon,
                onu.mac,
                label.client_name,
                label.splitter,
                label.splitter_port,
                label.model
            ),
            Self::SetWanService { onu, service } => format!(
                "{verb}::{},ONUIDTYPE=MAC,ONUID={}:CTAG::\
                 STATUS=1,MODE=3,CONNTYPE=2,VLAN={},COS=0,QOS=2,NAT=1,IPMODE=3,\
                 IPSTACKMODE=1,IP6SRCTYPE=0,PPPOEPROXY=2,PPPOEUSER={},PPPOEPASSWD={},\
                 PPPOENAME={},PPPOEMODE=1,{};",
                onu.pon,
                onu.mac,
                service.vlan,
                service.pppoe_user,
                service.pppoe_password.expose_secret(),
                service.pppoe_user,
                service.selector
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use insta::assert_snapshot;

    use super::*;

    fn onu() -> OnuEndpoint {
        OnuEndpoint::new(PonAddress::new("OLT1", 1, 2), "AABBCC")
    }

    #[test]
    fn session_commands() {
        let password = SecretString::from("s3cret");
        let login = Command::Login {
            username: "admin",
            password: &password,
        };
        assert_snapshot!(login.to_wire(), @"LOGIN:::CTAG::UN=admin,PWD=s3cret;");
        assert_snapshot!(Command::Logout.to_wire(), @"LOGOUT:::CTAG::;");
        assert_snapshot!(Command::ShakeHand.to_wire(), @"SHAKEHAND:::CTAG::;");
        assert!(!format!("{login:?}").contains("s3cret"));
    }

    #[test]
    fn query_commands() {
        let onu = onu();
        assert_snapshot!(
            Command::ListOnus { pon: &onu.pon }.to_wire(),
            @"LST-ONU::OLTID=OLT1,PONID=NA-NA-1-2:CTAG::;"
        );
        assert_snapshot!(
            Command::QueryOptical { onu: &onu }.to_wire(),
            @"LST-OMDDM::OLTID=OLT1,PONID=NA-NA-1-2,ONUIDTYPE=MAC,ONUID=AABBCC:CTAG::;"
        );
    }

    #[test]
    fn provisioning_commands() {
        let onu = onu();
        let password = SecretString::from("p");

        assert_snapshot!(
            Command::DeleteOnu { onu: &onu }.to_wire(),
            @"DEL-ONU::OLTID=OLT1,PONID=NA-NA-1-2:CTAG::ONUIDTYPE=MAC,ONUID=AABBCC;"
        );
        assert_snapshot!(
            Command::AddOnu {
                onu: &onu,
                label: OnuLabel {
                    client_name: "Maria",
                    splitter: "SPL-7",
                    splitter_port: "3",
                    model: "X",
                },
            }
            .to_wire(),
            @"ADD-ONU::OLTID=OLT1,PONID=NA-NA-1-2:CTAG::AUTHTYPE=MAC,ONUID=AABBCC,NAME=Maria | SPL-7 - 3,ONUTYPE=X;"
        );
        assert_snapshot!(
            Command::SetWanService {
                onu: &onu,
                service: WanService {
                    vlan: "100",
                    pppoe_user: "u",
                    pppoe_password: &password,
                    selector: WanSelector::Ssid(5),
                },
            }
            .to_wire(),
            @"SET-WANSERVICE::OLTID=OLT1,PONID=NA-NA-1-2,ONUIDTYPE=MAC,ONUID=AABBCC:CTAG::STATUS=1,MODE=3,CONNTYPE=2,VLAN=100,COS=0,QOS=2,NAT=1,IPMODE=3,IPSTACKMODE=1,IP6SRCTYPE=0,PPPOEPROXY=2,PPPOEUSER=u,PPPOEPASSWD=p,PPPOENAME=u,PPPOEMODE=1,SSID=5;"
        );
        assert_snapshot!(
            Command::ActivateLanPort { onu: &onu }.to_wire(),
            @"ACT-LANPORT::OLTID=OLT1,PONID=NA-NA-1-2,ONUIDTYPE=MAC,ONUID=AABBCC,ONUPORT=NA-NA-NA-1:CTAG::;"
        );
    }

    #[test]
    fn wan_profiles_are_four_uports_then_two_ssids() {
        let rendered: Vec<String> = WAN_PROFILES.iter().map(ToString::to_string).collect();
        assert_eq!(
            rendered,
            ["UPORT=1", "UPORT=2", "UPORT=3", "UPORT=4", "SSID=1", "SSID=5"]
        );
    }
}
